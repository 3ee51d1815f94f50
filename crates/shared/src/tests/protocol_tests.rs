use super::*;

fn addr(raw: &str) -> LocoAddress {
    raw.parse().expect("address")
}

#[test]
fn speed_command_carries_address_then_speed() {
    let cmd = ControlCommand::SetSpeed {
        address: addr("3"),
        speed: Speed::clamped(750),
    };
    assert_eq!(cmd.path(), "/setSpeed");
    assert_eq!(
        cmd.query(),
        vec![("address", "3".to_string()), ("speed", "750".to_string())]
    );
}

#[test]
fn function_command_encodes_power_as_bit() {
    let function = FunctionIndex::try_from(2u8).expect("f2");
    let on = ControlCommand::SetFunction {
        address: addr("7"),
        function,
        on: true,
    };
    assert_eq!(on.path(), "/setFunction");
    assert_eq!(
        on.query(),
        vec![
            ("address", "7".to_string()),
            ("function", "2".to_string()),
            ("power", "1".to_string()),
        ]
    );
    let off = ControlCommand::SetFunction {
        address: addr("7"),
        function,
        on: false,
    };
    assert_eq!(off.query()[2], ("power", "0".to_string()));
}

#[test]
fn system_halt_uses_broadcast_sentinel() {
    let cmd = ControlCommand::SystemHalt;
    assert_eq!(cmd.path(), "/setSystemHalt");
    assert_eq!(cmd.query(), vec![("address", "0x0000".to_string())]);
    assert!(cmd.address().is_none());
}

#[test]
fn emergency_without_selection_has_no_parameters() {
    let cmd = ControlCommand::Emergency { address: None };
    assert_eq!(cmd.path(), "/setEmergency");
    assert!(cmd.query().is_empty());
    let scoped = ControlCommand::Emergency {
        address: Some(addr("3")),
    };
    assert_eq!(scoped.query(), vec![("address", "3".to_string())]);
}

#[test]
fn power_body_parsing() {
    assert_eq!(parse_power_state("true"), Ok(true));
    assert_eq!(parse_power_state("false\n"), Ok(false));
    assert_eq!(
        parse_power_state("Error power function"),
        Err(DomainError::UnrecognizedPowerState(
            "Error power function".to_string()
        ))
    );
}
