//! 经 XML 文本层的端到端往返回归。
//!
//! # 教案式说明
//! - **Why**：单元测试只覆盖元素树层面的互逆；真实链路还要经过文本序列化，
//!   命名空间声明与实体转义都可能破坏可观察状态。
//! - **How**：每条用例都走 `encode → write_document → read_document → decode`
//!   的完整链路，再对可观察状态逐项断言。

use epp_core::test_stubs::{
    MARKER_NS, MarkerExtension, MarkerExtensionFactory, NoopMappingFactory, STUB_NS,
    StubCheckCommand, StubPongData,
};
use epp_core::xml::text::{read_document, write_document};
use epp_core::{
    Command, CommandKind, Component, DecodeContext, EncodeContext, EppMessage, EppResult,
    ExtensionComponent, ExtensionRegistry, Hello, MessageQueue, Response, TransferOp,
    decode_message, result_codes,
};

fn stub_registry() -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::new();
    registry.register_mapping(Box::new(NoopMappingFactory::new(STUB_NS)));
    registry.register_extension(Box::new(MarkerExtensionFactory::default()));
    registry
}

#[test]
fn command_survives_the_text_layer() {
    let registry = stub_registry();
    let encode_ctx = EncodeContext::new(&registry);
    let decode_ctx = DecodeContext::new(&registry);

    let command = Command::new(StubCheckCommand::with_names(["one.example", "two.example"]))
        .with_client_transaction_id("ABC-12345")
        .with_extension(Box::new(MarkerExtension::with_token("marker-token")));

    let tree = command.encode(&encode_ctx).expect("encode succeeds");
    let text = write_document(&tree).expect("write succeeds");
    let reparsed = read_document(&text).expect("read succeeds");
    assert_eq!(reparsed, tree);

    let decoded = match decode_message(&reparsed, &decode_ctx).expect("dispatch succeeds") {
        EppMessage::Command(command) => command,
        _ => panic!("a command document must dispatch to the command arm"),
    };
    assert_eq!(decoded.kind(), CommandKind::Check);
    assert_eq!(decoded.client_transaction_id(), Some("ABC-12345"));
    let payload = decoded
        .payload_as::<StubCheckCommand>()
        .expect("payload type survives");
    assert_eq!(payload.names(), ["one.example", "two.example"]);
    let marker = decoded
        .find_extension::<MarkerExtension>()
        .expect("extension survives");
    assert_eq!(marker.token(), "marker-token");
    assert_eq!(marker.namespace(), MARKER_NS);
}

#[test]
fn transfer_command_round_trips_every_operation() {
    // Why: 五种转移子操作都要经过文本层保真往返；缺失 op 的反例在单元层覆盖。
    let registry = stub_registry();
    let encode_ctx = EncodeContext::new(&registry);
    let decode_ctx = DecodeContext::new(&registry);

    for op in TransferOp::ALL {
        let command = Command::new(StubCheckCommand::transfer_probe())
            .with_transfer_op(op)
            .with_client_transaction_id("TRF-00001");
        let tree = command.encode(&encode_ctx).expect("encode succeeds");
        let text = write_document(&tree).expect("write succeeds");
        let reparsed = read_document(&text).expect("read succeeds");
        let decoded = match decode_message(&reparsed, &decode_ctx).expect("dispatch succeeds") {
            EppMessage::Command(command) => command,
            _ => panic!("transfer document must dispatch to the command arm"),
        };
        assert_eq!(decoded.kind(), CommandKind::Transfer);
        assert_eq!(decoded.transfer_op(), Some(op));
    }
}

#[test]
fn response_survives_the_text_layer() {
    let registry = stub_registry();
    let encode_ctx = EncodeContext::new(&registry);
    let decode_ctx = DecodeContext::new(&registry);

    let response = Response::new(
        EppResult::new(result_codes::SUCCESS, "Command completed successfully"),
        "SV-2026",
    )
    .with_client_transaction_id("ABC-12345")
    .with_message_queue(MessageQueue::new(2, "msg-9").with_message("pending transfer"))
    .with_payload(StubPongData::with_token("pong"))
    .with_extension(Box::new(MarkerExtension::with_token("resp-marker")));

    let tree = response.encode(&encode_ctx).expect("encode succeeds");
    let text = write_document(&tree).expect("write succeeds");
    let reparsed = read_document(&text).expect("read succeeds");
    assert_eq!(reparsed, tree);

    let decoded = match decode_message(&reparsed, &decode_ctx).expect("dispatch succeeds") {
        EppMessage::Response(response) => response,
        _ => panic!("a response document must dispatch to the response arm"),
    };
    assert!(decoded.is_success());
    assert_eq!(decoded.transaction_id().server(), "SV-2026");
    assert_eq!(decoded.message_queue().map(MessageQueue::count), Some(2));
    let payload = decoded
        .payload_as::<StubPongData>()
        .expect("payload type survives");
    assert_eq!(payload.token(), "pong");
    assert_eq!(decoded.extensions().len(), 1);
}

#[test]
fn hello_survives_the_text_layer() {
    let registry = stub_registry();
    let encode_ctx = EncodeContext::new(&registry);
    let decode_ctx = DecodeContext::new(&registry);
    let tree = Hello.encode(&encode_ctx).expect("encode succeeds");
    let text = write_document(&tree).expect("write succeeds");
    let reparsed = read_document(&text).expect("read succeeds");
    assert!(matches!(
        decode_message(&reparsed, &decode_ctx).expect("dispatch succeeds"),
        EppMessage::Hello
    ));
}
