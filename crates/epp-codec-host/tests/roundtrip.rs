//! 主机映射经注册中心与 XML 文本层的端到端回归。

use chrono::{DateTime, Utc};
use epp_codec_host::{
    HostAddress, HostCheckCommand, HostCreateCommand, HostCreateData, HostInfoData, HostMapping,
    HostStatusKind, HostUpdateCommand, HostUpdateGroup,
};
use epp_core::xml::text::{read_document, write_document};
use epp_core::{
    Command, Component, DecodeContext, EncodeContext, EppMessage, EppResult, ExtensionRegistry,
    Response, codes, decode_message, decode_response, result_codes,
};

fn host_registry() -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::new();
    registry.register_mapping(Box::new(HostMapping::new()));
    registry
}

fn round_trip_command(command: &Command, registry: &ExtensionRegistry) -> Command {
    let encode_ctx = EncodeContext::new(registry);
    let decode_ctx = DecodeContext::new(registry);
    let tree = command.encode(&encode_ctx).expect("encode succeeds");
    let text = write_document(&tree).expect("write succeeds");
    let reparsed = read_document(&text).expect("read succeeds");
    assert_eq!(reparsed, tree);
    match decode_message(&reparsed, &decode_ctx).expect("dispatch succeeds") {
        EppMessage::Command(decoded) => decoded,
        _ => panic!("a command document must dispatch to the command arm"),
    }
}

fn utc(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

#[test]
fn create_command_round_trips_both_address_families() {
    let registry = host_registry();
    let command = Command::new(
        HostCreateCommand::new("ns1.glue.example")
            .with_address(HostAddress::v4("192.0.2.2"))
            .with_address(HostAddress::v6("2001:db8::2")),
    )
    .with_client_transaction_id("HST-00001");
    let decoded = round_trip_command(&command, &registry);
    let payload = decoded
        .payload_as::<HostCreateCommand>()
        .expect("create payload survives");
    assert_eq!(payload.name(), "ns1.glue.example");
    assert_eq!(payload.addresses().len(), 2);
    assert_eq!(payload.addresses()[1].address(), "2001:db8::2");
}

#[test]
fn update_command_supports_rename() {
    let registry = host_registry();
    let command = Command::new(
        HostUpdateCommand::new("ns1.glue.example")
            .with_add(
                HostUpdateGroup::new()
                    .with_address(HostAddress::v4("192.0.2.7"))
                    .with_status(HostStatusKind::ClientUpdateProhibited),
            )
            .with_remove(HostUpdateGroup::new().with_address(HostAddress::v4("192.0.2.2")))
            .with_new_name("ns2.glue.example"),
    );
    let decoded = round_trip_command(&command, &registry);
    let payload = decoded
        .payload_as::<HostUpdateCommand>()
        .expect("update payload survives");
    assert_eq!(payload.new_name(), Some("ns2.glue.example"));
    assert_eq!(payload.add().addresses().len(), 1);
    assert_eq!(payload.add().statuses(), [HostStatusKind::ClientUpdateProhibited]);
    assert_eq!(payload.remove().addresses().len(), 1);
}

#[test]
fn empty_update_fails_encode() {
    let registry = host_registry();
    let ctx = EncodeContext::new(&registry);
    let command = Command::new(HostUpdateCommand::new("ns1.glue.example"));
    let err = command.encode(&ctx).unwrap_err();
    assert_eq!(err.code(), codes::ENCODE_MISSING_ATTRIBUTE);
}

#[test]
fn check_command_round_trips() {
    let registry = host_registry();
    let command = Command::new(HostCheckCommand::new(["ns1.a.example", "ns2.b.example"]));
    let decoded = round_trip_command(&command, &registry);
    let payload = decoded
        .payload_as::<HostCheckCommand>()
        .expect("check payload survives");
    assert_eq!(payload.names(), ["ns1.a.example", "ns2.b.example"]);
}

#[test]
fn create_and_info_responses_round_trip() {
    let registry = host_registry();
    let encode_ctx = EncodeContext::new(&registry);
    let decode_ctx = DecodeContext::new(&registry);

    let created = utc("2026-08-06T10:00:00Z");
    let response = Response::new(
        EppResult::new(result_codes::SUCCESS, "Command completed successfully"),
        "SV-31",
    )
    .with_payload(HostCreateData::new("ns1.glue.example", created));
    let tree = response.encode(&encode_ctx).expect("encode succeeds");
    let text = write_document(&tree).expect("write succeeds");
    let decoded = decode_response(&read_document(&text).expect("read"), &decode_ctx)
        .expect("decode succeeds");
    let payload = decoded
        .payload_as::<HostCreateData>()
        .expect("creData survives");
    assert_eq!(payload.create_date(), created);

    let info = HostInfoData::new("ns1.glue.example", "NS1EXAMPLE1-REP", "ClientY")
        .with_status(HostStatusKind::Linked)
        .with_address(HostAddress::v4("192.0.2.2"))
        .with_created("ClientX", utc("2024-04-03T22:00:00Z"));
    let response = Response::new(
        EppResult::new(result_codes::SUCCESS, "Command completed successfully"),
        "SV-32",
    )
    .with_payload(info.clone());
    let tree = response.encode(&encode_ctx).expect("encode succeeds");
    let text = write_document(&tree).expect("write succeeds");
    let decoded = decode_response(&read_document(&text).expect("read"), &decode_ctx)
        .expect("decode succeeds");
    let payload = decoded
        .payload_as::<HostInfoData>()
        .expect("infData survives");
    assert_eq!(*payload, info);
}
