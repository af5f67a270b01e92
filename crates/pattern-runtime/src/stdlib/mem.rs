// std::mem - data access and section management

use crate::error::{ErrorKind, EvalError};
use crate::eval::registry::{FunctionRegistry, ParameterCount};
use crate::eval::section::SectionId;
use crate::eval::value::{string_to_bytes, Value};
use crate::eval::Evaluator;

use crate::eval::decode::check_read_size;

use super::{arg_clamped, arg_range, arg_section};

const NAMESPACE: [&str; 3] = ["builtin", "std", "mem"];

/// Returned by the find functions when there is no match
pub const NOT_FOUND: u128 = u128::MAX;

pub fn register(registry: &mut FunctionRegistry) {
    registry.add_function(&NAMESPACE, "base_address", ParameterCount::none(), |ctx, _| {
        Ok(Some(Value::Unsigned(ctx.data_base_address() as u128)))
    });

    registry.add_function(&NAMESPACE, "size", ParameterCount::none(), |ctx, _| {
        Ok(Some(Value::Unsigned(ctx.data_size() as u128)))
    });

    // find_sequence_in_range(occurrence_index, start_offset, end_offset, bytes...)
    registry.add_function(
        &NAMESPACE,
        "find_sequence_in_range",
        ParameterCount::more_than(3),
        find_sequence_in_range,
    );

    // find_string_in_range(occurrence_index, start_offset, end_offset, string)
    registry.add_function(
        &NAMESPACE,
        "find_string_in_range",
        ParameterCount::exactly(4),
        find_string_in_range,
    );

    // read_unsigned(address, size, endian)
    registry.add_function(&NAMESPACE, "read_unsigned", ParameterCount::exactly(3), |ctx, params| {
        let size = params[1].to_signed()?;
        let width = check_read_size(size)?;
        let (address, _) = arg_range(ctx, SectionId::MAIN, params[0].to_unsigned()?, width.into())?;
        let endian = ctx.resolve_endian(params[2].to_unsigned()?)?;
        let value = ctx.read_unsigned(address, size, endian, SectionId::MAIN)?;
        Ok(Some(Value::Unsigned(value)))
    });

    // read_signed(address, size, endian)
    registry.add_function(&NAMESPACE, "read_signed", ParameterCount::exactly(3), |ctx, params| {
        let size = params[1].to_signed()?;
        let width = check_read_size(size)?;
        let (address, _) = arg_range(ctx, SectionId::MAIN, params[0].to_unsigned()?, width.into())?;
        let endian = ctx.resolve_endian(params[2].to_unsigned()?)?;
        let value = ctx.read_signed(address, size, endian, SectionId::MAIN)?;
        Ok(Some(Value::Signed(value)))
    });

    // read_string(address, size)
    registry.add_function(&NAMESPACE, "read_string", ParameterCount::exactly(2), |ctx, params| {
        let (address, size) = arg_range(
            ctx,
            SectionId::MAIN,
            params[0].to_unsigned()?,
            params[1].to_unsigned()?,
        )?;
        Ok(Some(Value::String(ctx.read_string(address, size)?)))
    });

    registry.add_function(&NAMESPACE, "create_section", ParameterCount::exactly(1), |ctx, params| {
        let name = params[0].to_display_string();
        Ok(Some(Value::Unsigned(ctx.create_section(name).0 as u128)))
    });

    registry.add_function(&NAMESPACE, "delete_section", ParameterCount::exactly(1), |ctx, params| {
        ctx.remove_section(arg_section(&params[0])?)?;
        Ok(None)
    });

    registry.add_function(
        &NAMESPACE,
        "get_section_size",
        ParameterCount::exactly(1),
        |ctx, params| {
            let size = ctx.section_size(arg_section(&params[0])?)?;
            Ok(Some(Value::Unsigned(size as u128)))
        },
    );

    // copy_to_section(from_id, from_address, to_id, to_address, size)
    registry.add_function(&NAMESPACE, "copy_to_section", ParameterCount::exactly(5), |ctx, params| {
        let to = arg_section(&params[2])?;
        ctx.check_copy_target(to)?;
        let from = arg_section(&params[0])?;
        let size = params[4].to_unsigned()?;
        let (from_address, size) = arg_range(ctx, from, params[1].to_unsigned()?, size)?;
        let (to_address, _) = arg_range(ctx, to, params[3].to_unsigned()?, size.into())?;
        ctx.copy_to_section(from, from_address, to, to_address, size)?;
        Ok(None)
    });

    // copy_value_to_section(value, section_id, to_address)
    registry.add_function(
        &NAMESPACE,
        "copy_value_to_section",
        ParameterCount::exactly(3),
        |ctx, params| {
            let to = arg_section(&params[1])?;
            ctx.check_copy_target(to)?;
            let (to_address, _) = arg_range(ctx, to, params[2].to_unsigned()?, 0)?;
            ctx.copy_value_to_section(&params[0], to, to_address)?;
            Ok(None)
        },
    );
}

fn find_sequence_in_range(
    ctx: &mut Evaluator<'_>,
    params: &[Value],
) -> Result<Option<Value>, EvalError> {
    let occurrence = arg_clamped(&params[0])?;
    let from = arg_clamped(&params[1])?;
    let to = arg_clamped(&params[2])?;
    let sequence = params[3..]
        .iter()
        .map(|param| {
            let byte = param.to_unsigned()?;
            u8::try_from(byte).map_err(|_| {
                EvalError::new(ErrorKind::InvalidByteValue(byte))
                    .with_hint("Try a value between 0x00 and 0xFF.")
            })
        })
        .collect::<Result<Vec<u8>, EvalError>>()?;
    let found = ctx.find_sequence(occurrence, from, to, &sequence)?;
    Ok(Some(Value::Unsigned(found.map_or(NOT_FOUND, u128::from))))
}

fn find_string_in_range(
    ctx: &mut Evaluator<'_>,
    params: &[Value],
) -> Result<Option<Value>, EvalError> {
    let occurrence = arg_clamped(&params[0])?;
    let from = arg_clamped(&params[1])?;
    let to = arg_clamped(&params[2])?;
    let sequence = string_to_bytes(&params[3].to_display_string());
    let found = ctx.find_sequence(occurrence, from, to, &sequence)?;
    Ok(Some(Value::Unsigned(found.map_or(NOT_FOUND, u128::from))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::eval::data_source::SliceDataSource;
    use crate::eval::pattern::{PatternNode, PatternValue};

    const BIG: u128 = 1;
    const LITTLE: u128 = 2;

    fn registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        register(&mut registry);
        registry
    }

    fn call(
        registry: &FunctionRegistry,
        ctx: &mut Evaluator<'_>,
        name: &str,
        args: &[Value],
    ) -> Result<Option<Value>, EvalError> {
        registry.call(ctx, &format!("std::mem::{}", name), args)
    }

    fn u(v: u128) -> Value {
        Value::Unsigned(v)
    }

    #[test]
    fn test_mem_size_and_base_address() {
        let registry = registry();
        let data = [0u8; 1024];
        let ds = SliceDataSource::new(&data);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        assert_eq!(call(&registry, &mut ctx, "size", &[]).unwrap(), Some(u(1024)));
        assert_eq!(
            call(&registry, &mut ctx, "base_address", &[]).unwrap(),
            Some(u(0))
        );
    }

    #[test]
    fn test_read_unsigned_and_signed() {
        let registry = registry();
        let data = [0x7F, 0x00, 0x00, 0x00, 0xFE, 0xFF];
        let ds = SliceDataSource::new(&data);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        let mut r = |name: &str, addr, size, endian| {
            call(&registry, &mut ctx, name, &[u(addr), u(size), u(endian)])
                .unwrap()
                .unwrap()
        };
        assert_eq!(r("read_signed", 0, 4, LITTLE), Value::Signed(127));
        assert_eq!(r("read_unsigned", 0, 4, LITTLE), u(127));
        assert_eq!(r("read_unsigned", 0, 4, BIG), u(2130706432));
        assert_eq!(r("read_signed", 4, 2, LITTLE), Value::Signed(-2));
        assert_eq!(r("read_unsigned", 4, 2, BIG), u(0xFEFF));
    }

    #[test]
    fn test_read_invalid_size() {
        let registry = registry();
        let data = [0u8; 32];
        let ds = SliceDataSource::new(&data);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        for name in ["read_unsigned", "read_signed"] {
            for size in [0, 17] {
                let err = call(&registry, &mut ctx, name, &[u(0), u(size), u(LITTLE)])
                    .unwrap_err();
                assert_eq!(err.kind, ErrorKind::InvalidSize(size as i128));
            }
        }
    }

    #[test]
    fn test_wide_addresses_are_out_of_bounds() {
        let registry = registry();
        let data = [0xAB, 0xCD];
        let ds = SliceDataSource::new(&data);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        let beyond = 1u128 << 64;

        for name in ["read_unsigned", "read_signed"] {
            let err = call(&registry, &mut ctx, name, &[u(beyond), u(1), u(LITTLE)]).unwrap_err();
            assert_eq!(
                err.kind,
                ErrorKind::OutOfBounds {
                    section: SectionId::MAIN,
                    address: beyond,
                    size: 1,
                    section_size: 2,
                }
            );
        }
        let err = call(&registry, &mut ctx, "read_string", &[u(0), u(beyond)]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::OutOfBounds { size, .. } if size == beyond));

        let id = ctx.create_section("out");
        let sid = u(id.0 as u128);
        let err = call(
            &registry,
            &mut ctx,
            "copy_to_section",
            &[u(0), u(beyond), sid.clone(), u(0), u(1)],
        )
        .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::OutOfBounds { section: SectionId::MAIN, .. }));
        let err = call(
            &registry,
            &mut ctx,
            "copy_to_section",
            &[u(0), u(0), sid.clone(), u(beyond), u(1)],
        )
        .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::OutOfBounds { section, .. } if section == id));
        let err = call(
            &registry,
            &mut ctx,
            "copy_value_to_section",
            &[Value::from("x"), sid, u(beyond)],
        )
        .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::OutOfBounds { section, .. } if section == id));
        assert_eq!(ctx.section_size(id).unwrap(), 0);

        // the main section stays immutable whatever the address
        let err = call(
            &registry,
            &mut ctx,
            "copy_to_section",
            &[u(0), u(0), u(0), u(beyond), u(1)],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ImmutableSection);
    }

    #[test]
    fn test_wide_section_ids_are_invalid() {
        let registry = registry();
        let ds = SliceDataSource::new(&[0u8; 4]);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        // 2^64 + 1 would alias section 1 if truncated
        let id = ctx.create_section("first");
        assert_eq!(id, SectionId(1));
        let wide = (1u128 << 64) + 1;
        for (name, args) in [
            ("get_section_size", vec![u(wide)]),
            ("delete_section", vec![u(wide)]),
            ("copy_to_section", vec![u(0), u(0), u(wide), u(0), u(1)]),
            ("copy_to_section", vec![u(wide), u(0), u(1), u(0), u(1)]),
            ("copy_value_to_section", vec![Value::from("x"), u(wide), u(0)]),
        ] {
            let err = call(&registry, &mut ctx, name, &args).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidSection(wide), "{}", name);
        }
        assert_eq!(ctx.section_size(id).unwrap(), 0);
        assert_eq!(
            ErrorKind::InvalidSection(wide).to_string(),
            "invalid section id 18446744073709551617"
        );
    }

    #[test]
    fn test_wide_search_bounds_clamp() {
        let registry = registry();
        let data = [0x10, 0x20];
        let ds = SliceDataSource::new(&data);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        let beyond = 1u128 << 64;
        let mut find = |args: &[Value]| {
            call(&registry, &mut ctx, "find_sequence_in_range", args).unwrap().unwrap()
        };
        assert_eq!(find(&[u(0), u(0), u(beyond), u(0x20)]), u(1));
        assert_eq!(find(&[u(0), u(beyond), u(0), u(0x10)]), u(NOT_FOUND));
        assert_eq!(find(&[u(beyond), u(0), u(0), u(0x10)]), u(NOT_FOUND));
    }

    #[test]
    fn test_read_string_is_raw() {
        let registry = registry();
        let data = *b"AB\0CD";
        let ds = SliceDataSource::new(&data);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        let result = call(&registry, &mut ctx, "read_string", &[u(1), u(3)]).unwrap();
        assert_eq!(result, Some(Value::from("B\0C")));
    }

    #[test]
    fn test_find_sequence_in_range() {
        let registry = registry();
        let data = [0x10, 0x20, 0x10, 0x20];
        let ds = SliceDataSource::new(&data);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        let mut find = |occurrence| {
            call(
                &registry,
                &mut ctx,
                "find_sequence_in_range",
                &[u(occurrence), u(0), u(0), u(0x10), u(0x20)],
            )
            .unwrap()
            .unwrap()
        };
        assert_eq!(find(1), u(2));
        assert_eq!(find(2), u(NOT_FOUND));
        assert_eq!(find(2), Value::Signed(-1));
    }

    #[test]
    fn test_find_sequence_rejects_bad_bytes() {
        let registry = registry();
        let ds = SliceDataSource::new(&[0u8; 4]);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        let err = call(
            &registry,
            &mut ctx,
            "find_sequence_in_range",
            &[u(0), u(0), u(0), u(0x100)],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidByteValue(0x100));
        assert_eq!(err.hint.as_deref(), Some("Try a value between 0x00 and 0xFF."));

        let err = call(&registry, &mut ctx, "find_sequence_in_range", &[u(0), u(0), u(0)])
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ArityMismatch { found: 3, .. }));
    }

    #[test]
    fn test_find_string_in_range() {
        let registry = registry();
        let data = *b"xxPNGxxPNG";
        let ds = SliceDataSource::new(&data);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        let found = call(
            &registry,
            &mut ctx,
            "find_string_in_range",
            &[u(1), u(0), u(0), Value::from("PNG")],
        )
        .unwrap();
        assert_eq!(found, Some(u(7)));
    }

    #[test]
    fn test_section_lifecycle() {
        let registry = registry();
        let ds = SliceDataSource::new(&[1, 2, 3, 4]);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        let id = call(&registry, &mut ctx, "create_section", &[Value::from("f.stream")])
            .unwrap()
            .unwrap();
        assert_eq!(
            call(&registry, &mut ctx, "get_section_size", &[id.clone()]).unwrap(),
            Some(u(0))
        );
        call(
            &registry,
            &mut ctx,
            "copy_to_section",
            &[u(0), u(0), id.clone(), u(6), u(2)],
        )
        .unwrap();
        assert_eq!(
            call(&registry, &mut ctx, "get_section_size", &[id.clone()]).unwrap(),
            Some(u(8))
        );
        let sid = SectionId(id.to_unsigned().unwrap() as u64);
        assert_eq!(ctx.read_data(0, 8, sid).unwrap(), vec![0, 0, 0, 0, 0, 0, 1, 2]);

        assert_eq!(
            call(&registry, &mut ctx, "delete_section", &[id.clone()]).unwrap(),
            None
        );
        let err = call(&registry, &mut ctx, "get_section_size", &[id]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSection(sid.into()));
    }

    #[test]
    fn test_copy_to_reserved_sections() {
        let registry = registry();
        let ds = SliceDataSource::new(&[1, 2, 3, 4]);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        let main = u(SectionId::MAIN.0 as u128);
        let heap = u(SectionId::HEAP.0 as u128);
        let err = call(
            &registry,
            &mut ctx,
            "copy_to_section",
            &[u(0), u(0), main.clone(), u(0), u(1)],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ImmutableSection);
        let err = call(
            &registry,
            &mut ctx,
            "copy_to_section",
            &[u(0), u(0), heap.clone(), u(0), u(1)],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSection(SectionId::HEAP.into()));
        let err = call(
            &registry,
            &mut ctx,
            "copy_value_to_section",
            &[Value::from("x"), main, u(0)],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ImmutableSection);
        let err = call(
            &registry,
            &mut ctx,
            "copy_value_to_section",
            &[Value::from("x"), heap, u(0)],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSection(SectionId::HEAP.into()));
    }

    #[test]
    fn test_delete_reserved_sections_fails() {
        let registry = registry();
        let ds = SliceDataSource::new(&[]);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        for id in [SectionId::MAIN, SectionId::HEAP] {
            let err = call(&registry, &mut ctx, "delete_section", &[u(id.0 as u128)])
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidSection(id.into()));
        }
    }

    #[test]
    fn test_copy_value_to_section_with_pattern() {
        let registry = registry();
        let data = [1, 0xFF, 2, 0xFF, 3, 0xFF, 4, 0xFF];
        let ds = SliceDataSource::new(&data);
        let mut ctx = Evaluator::new(&ds, &RuntimeConfig::default());
        let mut array = PatternNode::new("a", "u8[4]", SectionId::MAIN, 0, 8, PatternValue::Array);
        for i in 0..4 {
            array = array.with_child(PatternNode::new(
                "e",
                "u8",
                SectionId::MAIN,
                i * 2,
                1,
                PatternValue::Unsigned(i as u128 + 1),
            ));
        }
        let id = ctx.create_section("out");
        call(
            &registry,
            &mut ctx,
            "copy_value_to_section",
            &[Value::from(array), u(id.0 as u128), u(0)],
        )
        .unwrap();
        assert_eq!(ctx.section_size(id).unwrap(), 4);
        assert_eq!(ctx.read_data(0, 4, id).unwrap(), vec![1, 2, 3, 4]);
    }
}
