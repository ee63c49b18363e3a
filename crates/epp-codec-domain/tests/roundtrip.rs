//! 域名映射经注册中心与 XML 文本层的端到端回归。
//!
//! # 教案式说明
//! - **Why**：映射是核心契约的机械应用，回归点在于“工厂分发 + 模板往返 +
//!   映射级约束”三者的协作，而不是字段级的排列组合；
//! - **How**：所有用例都以注册了 [`DomainMapping`] 的注册中心为环境，
//!   命令走 `encode → write → read → decode_message` 完整链路。

use chrono::{DateTime, Utc};
use epp_codec_domain::{
    AuthInfo, CONTACT_NS, ContactType, DomainCheckCommand, DomainCheckData, DomainCheckItem,
    DomainContact, DomainCreateCommand, DomainInfoCommand, DomainMapping, DomainRenewCommand,
    DomainStatus, DomainStatusKind, DomainTransferCommand, DomainTransferData,
    DomainUpdateCommand, DomainUpdateGroup, HostsFilter, MAX_CHECK_NAMES, Period,
};
use epp_core::test_stubs::NoopMappingFactory;
use epp_core::xml::text::{read_document, write_document};
use epp_core::{
    Command, Component, DecodeContext, EncodeContext, EppMessage, EppResult, ExtensionRegistry,
    NotFoundKind, Response, TransferOp, TransferStatus, codes, decode_message, decode_response,
    result_codes,
};

fn domain_registry() -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::new();
    registry.register_mapping(Box::new(DomainMapping::new()));
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
fn check_command_round_trips() {
    let registry = domain_registry();
    let command = Command::new(DomainCheckCommand::new(["one.example", "two.example"]))
        .with_client_transaction_id("ABC-12345");
    let decoded = round_trip_command(&command, &registry);
    let payload = decoded
        .payload_as::<DomainCheckCommand>()
        .expect("check payload survives");
    assert_eq!(payload.names(), ["one.example", "two.example"]);
}

#[test]
fn check_command_enforces_the_name_budget() {
    // Why: 99 是 Schema 规定的查询上限，错误消息必须同时点出观测值与上限。
    let registry = domain_registry();
    let ctx = EncodeContext::new(&registry);
    let names: Vec<String> = (0..100).map(|i| format!("name-{i}.example")).collect();
    let command = Command::new(DomainCheckCommand::new(names));
    let err = command.encode(&ctx).unwrap_err();
    assert_eq!(err.code(), codes::ENCODE_OUT_OF_RANGE);
    assert!(err.message().contains("100"));
    assert!(err.message().contains(&MAX_CHECK_NAMES.to_string()));
}

#[test]
fn info_command_keeps_its_hosts_filter() {
    let registry = domain_registry();
    let command = Command::new(
        DomainInfoCommand::new("probe.example")
            .with_hosts(HostsFilter::Delegated)
            .with_auth_info(AuthInfo::new("2fooBAR")),
    );
    let decoded = round_trip_command(&command, &registry);
    let payload = decoded
        .payload_as::<DomainInfoCommand>()
        .expect("info payload survives");
    assert_eq!(payload.name(), "probe.example");
    assert_eq!(payload.hosts(), HostsFilter::Delegated);
}

#[test]
fn create_command_encodes_contacts_only_when_negotiated() {
    // Why: 联系人关联是可选特性，编码侧必须依据 has_service 的协商结论分支。
    let create = DomainCreateCommand::new("fresh.example", AuthInfo::new("2fooBAR"))
        .with_period(Period::years(2))
        .with_nameserver("ns1.fresh.example")
        .with_registrant("jd1234")
        .with_contact(DomainContact::new(ContactType::Admin, "sh8013"));

    // 未协商联系人映射：registrant 与 contact 子元素不出现在线上。
    let bare = domain_registry();
    let decoded = round_trip_command(&Command::new(create.clone()), &bare);
    let payload = decoded
        .payload_as::<DomainCreateCommand>()
        .expect("create payload survives");
    assert!(payload.registrant().is_none());
    assert!(payload.contacts().is_empty());
    assert_eq!(payload.nameservers(), ["ns1.fresh.example"]);
    assert_eq!(payload.period(), Some(Period::years(2)));

    // 协商了联系人映射：关联全部编码并保真往返。
    let mut negotiated = domain_registry();
    negotiated.register_mapping(Box::new(NoopMappingFactory::new(CONTACT_NS)));
    let decoded = round_trip_command(&Command::new(create.clone()), &negotiated);
    let payload = decoded
        .payload_as::<DomainCreateCommand>()
        .expect("create payload survives");
    assert_eq!(payload.registrant(), Some("jd1234"));
    assert_eq!(payload.contacts(), create.contacts());
}

#[test]
fn renew_command_round_trips_its_dates() {
    let registry = domain_registry();
    let expiry = chrono::NaiveDate::from_ymd_opt(2027, 4, 3).expect("valid date");
    let command = Command::new(
        DomainRenewCommand::new("renew.example", expiry).with_period(Period::years(5)),
    );
    let decoded = round_trip_command(&command, &registry);
    let payload = decoded
        .payload_as::<DomainRenewCommand>()
        .expect("renew payload survives");
    assert_eq!(payload.current_expiry_date(), expiry);
    assert_eq!(payload.period(), Some(Period::years(5)));
}

#[test]
fn transfer_command_preserves_each_operation() {
    // Why: 转移完备性——五种子操作构造、往返都必须保值。
    let registry = domain_registry();
    for op in TransferOp::ALL {
        let command = Command::new(
            DomainTransferCommand::new("move.example").with_auth_info(AuthInfo::new("2fooBAR")),
        )
        .with_transfer_op(op);
        let decoded = round_trip_command(&command, &registry);
        assert_eq!(decoded.transfer_op(), Some(op));
        let payload = decoded
            .payload_as::<DomainTransferCommand>()
            .expect("transfer payload survives");
        assert_eq!(payload.name(), "move.example");
    }
}

#[test]
fn transfer_command_without_operation_fails_encode() {
    let registry = domain_registry();
    let ctx = EncodeContext::new(&registry);
    let command = Command::new(DomainTransferCommand::new("move.example"));
    let err = command.encode(&ctx).unwrap_err();
    assert_eq!(err.code(), codes::ENCODE_MISSING_ATTRIBUTE);
    assert!(err.message().contains("op"));
}

#[test]
fn update_command_round_trips_all_three_groups() {
    let registry = domain_registry();
    let command = Command::new(
        DomainUpdateCommand::new("shift.example")
            .with_add(
                DomainUpdateGroup::new()
                    .with_nameserver("ns2.shift.example")
                    .with_status(DomainStatus::new(DomainStatusKind::ClientHold).with_message(
                        "payment overdue",
                        "en",
                    )),
            )
            .with_remove(DomainUpdateGroup::new().with_nameserver("ns1.shift.example"))
            .with_change(
                epp_codec_domain::DomainChange::new().with_auth_info(AuthInfo::new("newBAR2")),
            ),
    );
    let decoded = round_trip_command(&command, &registry);
    let payload = decoded
        .payload_as::<DomainUpdateCommand>()
        .expect("update payload survives");
    assert_eq!(payload.add().nameservers(), ["ns2.shift.example"]);
    assert_eq!(payload.add().statuses().len(), 1);
    assert_eq!(payload.remove().nameservers(), ["ns1.shift.example"]);
    assert!(!payload.change().is_empty());
}

#[test]
fn empty_update_fails_encode() {
    let registry = domain_registry();
    let ctx = EncodeContext::new(&registry);
    let command = Command::new(DomainUpdateCommand::new("noop.example"));
    let err = command.encode(&ctx).unwrap_err();
    assert_eq!(err.code(), codes::ENCODE_MISSING_ATTRIBUTE);
}

#[test]
fn check_response_round_trips_through_the_factory() {
    let registry = domain_registry();
    let encode_ctx = EncodeContext::new(&registry);
    let decode_ctx = DecodeContext::new(&registry);

    let response = Response::new(
        EppResult::new(result_codes::SUCCESS, "Command completed successfully"),
        "SV-77",
    )
    .with_payload(DomainCheckData::new([
        DomainCheckItem::new("free.example", true),
        DomainCheckItem::new("taken.example", false).with_reason("In use"),
    ]));

    let tree = response.encode(&encode_ctx).expect("encode succeeds");
    let text = write_document(&tree).expect("write succeeds");
    let reparsed = read_document(&text).expect("read succeeds");
    let decoded = decode_response(&reparsed, &decode_ctx).expect("decode succeeds");
    assert!(decoded.is_success());
    let payload = decoded
        .payload_as::<DomainCheckData>()
        .expect("chkData survives");
    assert_eq!(payload.items().len(), 2);
    assert!(payload.items()[0].is_available());
    assert_eq!(payload.items()[1].reason(), Some("In use"));
}

#[test]
fn transfer_response_carries_workflow_state() {
    // Why: 转移响应必须承载文本化流程状态与双方标识/时间戳——
    //      命令侧只有子操作，状态机在服务端。
    let registry = domain_registry();
    let encode_ctx = EncodeContext::new(&registry);
    let decode_ctx = DecodeContext::new(&registry);

    let data = DomainTransferData::new(
        "move.example",
        TransferStatus::Pending,
        "ClientX",
        utc("2026-08-01T09:00:00Z"),
        "ClientY",
        utc("2026-08-06T09:00:00Z"),
    )
    .with_expiry_date(utc("2027-08-01T09:00:00Z"));

    let response = Response::new(
        EppResult::new(
            result_codes::SUCCESS_ACTION_PENDING,
            "Command completed successfully; action pending",
        ),
        "SV-88",
    )
    .with_payload(data.clone());

    let tree = response.encode(&encode_ctx).expect("encode succeeds");
    let text = write_document(&tree).expect("write succeeds");
    let reparsed = read_document(&text).expect("read succeeds");
    let decoded = decode_response(&reparsed, &decode_ctx).expect("decode succeeds");
    let payload = decoded
        .payload_as::<DomainTransferData>()
        .expect("trnData survives");
    assert_eq!(*payload, data);
}

#[test]
fn unregistered_mapping_namespace_is_reported_with_kind() {
    // Why: 未注册映射的报文要报 component_not_found(kind=command)，
    //      与畸形报文区分开。
    let registry = domain_registry();
    let command = Command::new(DomainCheckCommand::new(["one.example"]));
    let encode_ctx = EncodeContext::new(&registry);
    let tree = command.encode(&encode_ctx).expect("encode succeeds");

    let empty = ExtensionRegistry::new();
    let decode_ctx = DecodeContext::new(&empty);
    let err = decode_message(&tree, &decode_ctx).unwrap_err();
    assert_eq!(err.component_not_found_kind(), Some(NotFoundKind::Command));
}

#[test]
fn duplicate_keeps_payload_and_extensions_independent() {
    let command = Command::new(DomainCheckCommand::new(["copy.example"]))
        .with_client_transaction_id("DUP-00001");
    let copy = command.duplicate();
    let original = command
        .payload_as::<DomainCheckCommand>()
        .expect("original payload");
    let cloned = copy
        .payload_as::<DomainCheckCommand>()
        .expect("cloned payload");
    assert_eq!(original, cloned);
    assert!(!core::ptr::eq(original, cloned));
    assert_eq!(copy.client_transaction_id(), Some("DUP-00001"));
}
