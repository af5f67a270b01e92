// DataSource trait: abstraction over the main section's backing bytes

use crate::error::{ErrorKind, EvalError};
use crate::eval::section::SectionId;

/// Trait for accessing the originally loaded input during evaluation
pub trait DataSource {
    /// Read bytes from the given offset
    fn read_bytes(&self, offset: u64, size: u64) -> Result<Vec<u8>, EvalError>;

    /// Get the total size of the data
    fn size(&self) -> u64;

    /// The whole input as one borrowed slice, for sources that hold it in memory
    fn as_slice(&self) -> Option<&[u8]> {
        None
    }
}

/// DataSource backed by a byte slice
pub struct SliceDataSource<'a> {
    data: &'a [u8],
}

impl<'a> SliceDataSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> DataSource for SliceDataSource<'a> {
    fn read_bytes(&self, offset: u64, size: u64) -> Result<Vec<u8>, EvalError> {
        let range = checked_range(offset, size, self.data.len() as u64).ok_or_else(|| {
            EvalError::new(ErrorKind::OutOfBounds {
                section: SectionId::MAIN,
                address: offset.into(),
                size: size.into(),
                section_size: self.data.len() as u64,
            })
        })?;
        Ok(self.data[range].to_vec())
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn as_slice(&self) -> Option<&[u8]> {
        Some(self.data)
    }
}

/// `offset..offset + size` as a slice range, if it fits in `len`
pub(crate) fn checked_range(offset: u64, size: u64, len: u64) -> Option<std::ops::Range<usize>> {
    let end = offset.checked_add(size)?;
    (end <= len).then(|| offset as usize..end as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_data_source_read() {
        let data = vec![0x89, 0x50, 0x4E, 0x47];
        let ds = SliceDataSource::new(&data);
        assert_eq!(ds.read_bytes(0, 4).unwrap(), vec![0x89, 0x50, 0x4E, 0x47]);
        assert_eq!(ds.read_bytes(1, 2).unwrap(), vec![0x50, 0x4E]);
    }

    #[test]
    fn test_slice_data_source_out_of_bounds() {
        let data = vec![0x00, 0x01];
        let ds = SliceDataSource::new(&data);
        let err = ds.read_bytes(1, 2).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::OutOfBounds {
                section: SectionId::MAIN,
                address: 1,
                size: 2,
                section_size: 2,
            }
        );
    }

    #[test]
    fn test_slice_data_source_overflowing_range() {
        let data = vec![0; 4];
        let ds = SliceDataSource::new(&data);
        assert!(ds.read_bytes(u64::MAX, 2).is_err());
    }

    #[test]
    fn test_slice_data_source_borrows_input() {
        let data = vec![1, 2, 3];
        let ds = SliceDataSource::new(&data);
        let slice = ds.as_slice().unwrap();
        assert_eq!(slice, &[1, 2, 3]);
        assert!(std::ptr::eq(slice.as_ptr(), data.as_ptr()));
    }

    #[test]
    fn test_slice_data_source_size() {
        let data = vec![0; 100];
        let ds = SliceDataSource::new(&data);
        assert_eq!(ds.size(), 100);
    }
}
