#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![doc = "epp-core: EPP（可扩展供应协议）编解码与会话协商的核心契约。"]
#![doc = ""]
#![doc = "== 职责边界 =="]
#![doc = "本 crate 覆盖消息/命令/响应抽象、所有具体操作共享的 Template-Method 编解码协议、"]
#![doc = "以命名空间为键的可扩展注册中心、转移操作属性模型，以及 Login/问候语的服务协商算法。"]
#![doc = "对象映射（domain、host 等）以独立 crate 的形式实现核心契约；网络传输与会话管理不在此层。"]
#![doc = ""]
#![doc = "== 内存分配依赖 =="]
#![doc = "核心契约定位于 `no_std + alloc` 场景：元素树与信封模型依赖 [`alloc`] 中的"]
#![doc = "`Box`、`Vec`、`String`。XML 文本层（`xml::text`）以 `quick-xml` 实现，仅在 `std` Feature 下编译。"]

extern crate alloc;

pub mod command;
pub mod component;
pub mod config;
pub mod error;
pub mod message;
pub mod registry;
pub mod response;
pub mod session;
/// 测试桩命名空间，集中暴露框架官方维护的 Stub 映射与扩展，供集成测试与示例复用。
///
/// # 设计背景（Why）
/// - 统一维护常见桩对象，避免在各处重复定义最小映射；
/// - 当核心契约演进时，通过单点更新保证所有测试同步适配。
pub mod test_stubs;
pub mod transfer;
pub mod xml;

pub use command::{
    CLIENT_TRANSACTION_ID_MAX, CLIENT_TRANSACTION_ID_MIN, Command, CommandKind, CommandPayload,
    decode_command,
};
pub use component::{Component, DecodeContext, EncodeContext, ExtensionComponent};
pub use config::{CodecConfig, DuplicatePolicy};
pub use error::{EppError, NotFoundKind, Result, codes};
pub use message::{EppMessage, Hello, Message, decode_message};
pub use registry::{ExtensionFactory, ExtensionRegistry, MappingFactory, ServiceDescriptor};
pub use response::{
    EppResult, ExtValue, MessageQueue, Response, ResponsePayload, TransactionId, decode_response,
    result_codes,
};
pub use session::{
    DEFAULT_LANGUAGE, DataCollectionPolicy, DcpAccess, DcpExpiry, DcpPurpose, DcpRecipient,
    DcpRetention, DcpStatement, Greeting, LoginCommand, LogoutCommand, PROTOCOL_VERSION,
    PollCommand, PollOp, ServiceMenu, decode_greeting,
};
pub use transfer::{TransferOp, TransferStatus};
pub use xml::{Element, ns};
