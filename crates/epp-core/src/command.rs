//! 命令信封与 Template-Method 编解码驱动。
//!
//! # 设计目标（Why）
//! - 每个具体命令的信封部分（事务号、扩展块、转移 `op` 属性）完全相同，
//!   只有动词载荷随映射变化；把不变部分固化在驱动器里、可变部分下沉到
//!   [`CommandPayload`] 钩子，新增映射时核心一行不改；
//! - 采用组合而非继承：具体映射实现一个小接口，而不是从基类继承模板方法。
//!
//! # 契约说明（What）
//! - 编码顺序固定：动词元素 → `<extension>` 块 → `<clTRID>`；
//! - 客户端事务号存在时长度必须落在 [3, 64]；
//! - 转移命令必须恰好携带一个 [`TransferOp`]，缺失即编码失败；
//! - 解码在第一处缺陷即失败，未注册命名空间以 `component_not_found` 报告。

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::component::{Component, DecodeContext, EncodeContext, ExtensionComponent};
use crate::config::DuplicatePolicy;
use crate::error::{EppError, Result, codes};
use crate::message::Message;
use crate::transfer::TransferOp;
use crate::xml::{Element, ns};

/// 客户端事务号的最小长度（字符数）。
pub const CLIENT_TRANSACTION_ID_MIN: usize = 3;
/// 客户端事务号的最大长度（字符数）。
pub const CLIENT_TRANSACTION_ID_MAX: usize = 64;

/// 命令类型：信封动词元素的身份。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// 对象可用性查询。
    Check,
    /// 对象创建。
    Create,
    /// 对象删除。
    Delete,
    /// 对象详情查询。
    Info,
    /// 会话建立。
    Login,
    /// 会话结束。
    Logout,
    /// 消息队列轮询。
    Poll,
    /// 对象续期。
    Renew,
    /// 对象转移（携带子操作）。
    Transfer,
    /// 对象更新。
    Update,
}

impl CommandKind {
    /// 信封动词元素的本地名。
    pub fn tag(self) -> &'static str {
        match self {
            CommandKind::Check => "check",
            CommandKind::Create => "create",
            CommandKind::Delete => "delete",
            CommandKind::Info => "info",
            CommandKind::Login => "login",
            CommandKind::Logout => "logout",
            CommandKind::Poll => "poll",
            CommandKind::Renew => "renew",
            CommandKind::Transfer => "transfer",
            CommandKind::Update => "update",
        }
    }

    /// 从动词元素本地名反查命令类型。
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "check" => Some(CommandKind::Check),
            "create" => Some(CommandKind::Create),
            "delete" => Some(CommandKind::Delete),
            "info" => Some(CommandKind::Info),
            "login" => Some(CommandKind::Login),
            "logout" => Some(CommandKind::Logout),
            "poll" => Some(CommandKind::Poll),
            "renew" => Some(CommandKind::Renew),
            "transfer" => Some(CommandKind::Transfer),
            "update" => Some(CommandKind::Update),
            _ => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// 命令载荷钩子：驱动器把信封之内的动词元素交给它。
///
/// # 行为逻辑（How）
/// - `encode_payload` 产出完整的动词元素（例如 `<check><domain:check>…</domain:check></check>`
///   或会话命令 `<login>…</login>`）；转移命令的 `op` 属性由驱动器补写；
/// - `decode_payload` 接收驱动器定位好的动词元素并恢复载荷状态。
pub trait CommandPayload: Send + Sync + 'static {
    /// 载荷所属命名空间（对象映射的 URI，会话命令为核心命名空间）。
    fn namespace(&self) -> &str;

    /// 命令类型。
    fn kind(&self) -> CommandKind;

    /// 产出信封内的动词元素。
    fn encode_payload(&self, ctx: &EncodeContext<'_>) -> Result<Element>;

    /// 从动词元素恢复载荷状态。
    fn decode_payload(&mut self, verb: &Element, ctx: &DecodeContext<'_>) -> Result<()>;

    /// 保持载荷类型的深拷贝。
    fn duplicate_payload(&self) -> Box<dyn CommandPayload>;

    /// `Any` 视图，支撑解码后按具体类型取回载荷。
    fn as_any(&self) -> &dyn Any;
}

/// 命令信封：客户端发往服务端的完整消息。
///
/// # 契约说明（What）
/// - 扩展列表与事务号在编码前可变；实例不支持并发修改，
///   跨任务传递请使用 [`Command::duplicate`] 得到的独立副本。
pub struct Command {
    payload: Box<dyn CommandPayload>,
    transfer_op: Option<TransferOp>,
    client_transaction_id: Option<String>,
    extensions: Vec<Box<dyn ExtensionComponent>>,
}

impl core::fmt::Debug for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Command")
            .field("namespace", &self.payload.namespace())
            .field("kind", &self.payload.kind())
            .field("transfer_op", &self.transfer_op)
            .field("client_transaction_id", &self.client_transaction_id)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

impl Command {
    /// 以具体载荷构造命令。
    pub fn new(payload: impl CommandPayload) -> Self {
        Self::from_boxed(Box::new(payload))
    }

    /// 以装箱载荷构造命令（工厂路径使用）。
    pub fn from_boxed(payload: Box<dyn CommandPayload>) -> Self {
        Self {
            payload,
            transfer_op: None,
            client_transaction_id: None,
            extensions: Vec::new(),
        }
    }

    /// 命令类型。
    pub fn kind(&self) -> CommandKind {
        self.payload.kind()
    }

    /// 载荷的只读视图。
    pub fn payload(&self) -> &dyn CommandPayload {
        self.payload.as_ref()
    }

    /// 按具体类型取回载荷。
    pub fn payload_as<T: CommandPayload>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }

    /// 转移子操作。
    pub fn transfer_op(&self) -> Option<TransferOp> {
        self.transfer_op
    }

    /// Builder：设置转移子操作。
    pub fn with_transfer_op(mut self, op: TransferOp) -> Self {
        self.transfer_op = Some(op);
        self
    }

    /// 就地设置转移子操作。
    pub fn set_transfer_op(&mut self, op: TransferOp) {
        self.transfer_op = Some(op);
    }

    /// 客户端事务号。
    pub fn client_transaction_id(&self) -> Option<&str> {
        self.client_transaction_id.as_deref()
    }

    /// Builder：设置客户端事务号（长度在编码时校验）。
    pub fn with_client_transaction_id(mut self, id: impl Into<String>) -> Self {
        self.client_transaction_id = Some(id.into());
        self
    }

    /// 就地设置或清除客户端事务号。
    pub fn set_client_transaction_id(&mut self, id: Option<String>) {
        self.client_transaction_id = id;
    }

    /// 挂接一个扩展，保持挂接顺序。
    pub fn attach_extension(&mut self, extension: Box<dyn ExtensionComponent>) {
        self.extensions.push(extension);
    }

    /// Builder：挂接一个扩展。
    pub fn with_extension(mut self, extension: Box<dyn ExtensionComponent>) -> Self {
        self.extensions.push(extension);
        self
    }

    /// 已挂接的扩展序列（文档顺序）。
    pub fn extensions(&self) -> &[Box<dyn ExtensionComponent>] {
        &self.extensions
    }

    /// 按类型查找首个扩展。
    pub fn find_extension<T: ExtensionComponent>(&self) -> Option<&T> {
        self.extensions
            .iter()
            .find_map(|extension| extension.as_any().downcast_ref::<T>())
    }

    /// 按类型查找扩展并要求唯一。
    ///
    /// # 契约说明（What）
    /// - 零份返回 `Ok(None)`；恰一份返回 `Ok(Some(_))`；
    /// - 多份返回 `epp.extension.duplicate`——这是调用方显式选择的严格路径，
    ///   与 [`crate::config::DuplicatePolicy`] 的解码期策略相互独立。
    pub fn find_unique_extension<T: ExtensionComponent>(&self) -> Result<Option<&T>> {
        let mut found: Option<&T> = None;
        for extension in &self.extensions {
            if let Some(typed) = extension.as_any().downcast_ref::<T>() {
                if found.is_some() {
                    return Err(EppError::duplicate_extension(extension.namespace()));
                }
                found = Some(typed);
            }
        }
        Ok(found)
    }

    /// 深拷贝：载荷与每个扩展都各自复制。
    pub fn duplicate(&self) -> Command {
        Command {
            payload: self.payload.duplicate_payload(),
            transfer_op: self.transfer_op,
            client_transaction_id: self.client_transaction_id.clone(),
            extensions: self
                .extensions
                .iter()
                .map(|extension| extension.duplicate_extension())
                .collect(),
        }
    }

    fn validate_transaction_id(id: &str) -> Result<()> {
        let length = id.chars().count();
        if !(CLIENT_TRANSACTION_ID_MIN..=CLIENT_TRANSACTION_ID_MAX).contains(&length) {
            return Err(EppError::new(
                codes::ENCODE_OUT_OF_RANGE,
                format!(
                    "client transaction id length {length} is outside \
                     [{CLIENT_TRANSACTION_ID_MIN}, {CLIENT_TRANSACTION_ID_MAX}]"
                ),
            ));
        }
        Ok(())
    }
}

impl Component for Command {
    fn encode(&self, ctx: &EncodeContext<'_>) -> Result<Element> {
        // === 模板步骤 ===
        // 1. 信封不变式：事务号长度、转移命令的 op 属性；
        // 2. 动词元素由载荷钩子产出；
        // 3. 扩展统一包进一个 <extension> 块，各自走自身的 encode；
        // 4. 事务号收尾。任一步失败都不会产出半成品信封。
        if let Some(id) = &self.client_transaction_id {
            Self::validate_transaction_id(id)?;
        }

        let mut verb = self.payload.encode_payload(ctx)?;
        if self.payload.kind() == CommandKind::Transfer {
            match self.transfer_op {
                Some(op) => verb.set_attribute("op", op.as_str()),
                None => return Err(EppError::missing_attribute("op")),
            }
        }

        let mut command = Element::new(ns::EPP, "command").with_child(verb);
        if !self.extensions.is_empty() {
            let mut block = Element::new(ns::EPP, "extension");
            for extension in &self.extensions {
                block.push_child(extension.encode(ctx)?);
            }
            command.push_child(block);
        }
        if let Some(id) = &self.client_transaction_id {
            command.push_child(Element::new(ns::EPP, "clTRID").with_text(id.clone()));
        }

        Ok(Element::new(ns::EPP, "epp").with_child(command))
    }

    fn decode(&mut self, element: &Element, ctx: &DecodeContext<'_>) -> Result<()> {
        let command = element.require_child(ns::EPP, "command")?;
        let verb = find_verb(command)?;

        let expected = self.payload.kind();
        if !verb.is_named(ns::EPP, expected.tag()) {
            return Err(EppError::malformed(format!(
                "expected <{}> command element, found <{}>",
                expected.tag(),
                verb.local_name()
            )));
        }

        self.transfer_op = None;
        if expected == CommandKind::Transfer {
            self.transfer_op = Some(TransferOp::parse(verb.require_attribute("op")?)?);
        }

        self.payload.decode_payload(verb, ctx)?;

        self.extensions.clear();
        if let Some(block) = command.child(ns::EPP, "extension") {
            for child in block.children() {
                let mut extension = ctx.registry().create_extension(child)?;
                extension.decode(child, ctx)?;
                if ctx.config().duplicate_extensions == DuplicatePolicy::Reject
                    && self
                        .extensions
                        .iter()
                        .any(|existing| existing.namespace() == extension.namespace())
                {
                    return Err(EppError::duplicate_extension(extension.namespace()));
                }
                self.extensions.push(extension);
            }
        }

        self.client_transaction_id = command.child_text(ns::EPP, "clTRID").map(ToOwned::to_owned);
        Ok(())
    }

    fn duplicate(&self) -> Box<dyn Component> {
        Box::new(Command::duplicate(self))
    }
}

impl Message for Command {
    fn namespace(&self) -> &str {
        self.payload.namespace()
    }
}

fn find_verb(command: &Element) -> Result<&Element> {
    command
        .children()
        .iter()
        .find(|child| {
            !(child.is_named(ns::EPP, "extension") || child.is_named(ns::EPP, "clTRID"))
        })
        .ok_or_else(|| EppError::malformed("command envelope is missing its verb element"))
}

/// 解码入口：从 `<epp>` 根元素恢复一条完整命令。
///
/// # 行为逻辑（How）
/// 1. 定位信封动词元素；
/// 2. 核心命名空间动词（login/logout/poll）直接本地实例化，
///    对象动词将其首个映射子元素交给注册中心的 `create_command`；
/// 3. 对实例执行完整的模板解码。
///
/// # 契约说明（What）
/// - 未注册的映射命名空间报 `component_not_found`（kind = command）；
/// - 动词元素缺失或不在核心命名空间内报 `epp.decode.malformed`。
pub fn decode_command(root: &Element, ctx: &DecodeContext<'_>) -> Result<Command> {
    let command = root.require_child(ns::EPP, "command")?;
    let verb = find_verb(command)?;
    if verb.namespace() != ns::EPP {
        return Err(EppError::malformed(format!(
            "command verb <{}> is outside the epp namespace",
            verb.local_name()
        )));
    }
    let Some(kind) = CommandKind::from_tag(verb.local_name()) else {
        return Err(EppError::malformed(format!(
            "`{}` is not an epp command",
            verb.local_name()
        )));
    };

    let mut decoded = match kind {
        CommandKind::Login => Command::new(crate::session::LoginCommand::default()),
        CommandKind::Logout => Command::new(crate::session::LogoutCommand::default()),
        CommandKind::Poll => Command::new(crate::session::PollCommand::default()),
        _ => {
            let mapping = verb.first_child().ok_or_else(|| {
                EppError::malformed(format!(
                    "object command <{}> is missing its mapping payload",
                    verb.local_name()
                ))
            })?;
            ctx.registry().create_command(mapping)?
        }
    };
    decoded.decode(root, ctx)?;
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::registry::ExtensionRegistry;
    use crate::test_stubs::{
        MarkerExtension, MarkerExtensionFactory, NoopMappingFactory, STUB_NS, StubCheckCommand,
    };

    fn registry_with_stubs() -> ExtensionRegistry {
        let mut registry = ExtensionRegistry::new();
        registry.register_mapping(Box::new(NoopMappingFactory::new(STUB_NS)));
        registry.register_extension(Box::new(MarkerExtensionFactory::default()));
        registry
    }

    #[test]
    fn command_round_trips_with_extension_and_transaction_id() {
        // Why: 模板方法的编码顺序与解码顺序必须互逆，这是所有映射的共同地基。
        let registry = registry_with_stubs();
        let encode_ctx = crate::component::EncodeContext::new(&registry);
        let decode_ctx = DecodeContext::new(&registry);

        let command = Command::new(StubCheckCommand::with_names(["one.example", "two.example"]))
            .with_client_transaction_id("ABC-12345")
            .with_extension(Box::new(MarkerExtension::with_token("t-1")));

        let encoded = command.encode(&encode_ctx).expect("encode succeeds");
        let decoded = decode_command(&encoded, &decode_ctx).expect("decode succeeds");

        assert_eq!(decoded.kind(), CommandKind::Check);
        assert_eq!(decoded.client_transaction_id(), Some("ABC-12345"));
        let payload = decoded
            .payload_as::<StubCheckCommand>()
            .expect("payload keeps its concrete type");
        assert_eq!(payload.names(), ["one.example", "two.example"]);
        let marker = decoded
            .find_extension::<MarkerExtension>()
            .expect("extension resolved through the registry");
        assert_eq!(marker.token(), "t-1");
    }

    #[test]
    fn transaction_id_bounds_are_enforced_at_encode() {
        // Why: 事务号长度是编码期不变式，越界必须在发出任何元素前失败。
        let registry = registry_with_stubs();
        let ctx = crate::component::EncodeContext::new(&registry);
        for id in ["ab", "x".repeat(65).as_str()] {
            let command =
                Command::new(StubCheckCommand::with_names(["a.example"])).with_client_transaction_id(id);
            let err = command.encode(&ctx).unwrap_err();
            assert_eq!(err.code(), codes::ENCODE_OUT_OF_RANGE);
        }
    }

    #[test]
    fn transfer_command_requires_exactly_one_operation() {
        // Why: 转移命令“恰有一个操作值”的保证由驱动器承担，缺失必须编码失败。
        let registry = registry_with_stubs();
        let ctx = crate::component::EncodeContext::new(&registry);
        let command = Command::new(StubCheckCommand::transfer_probe());
        let err = command.encode(&ctx).unwrap_err();
        assert_eq!(err.code(), codes::ENCODE_MISSING_ATTRIBUTE);
        assert!(err.message().contains("op"));
    }

    #[test]
    fn unknown_extension_namespace_is_component_not_found() {
        // Why: 扩展块里未注册的命名空间要带 kind=extension 标记上报，
        //      让会话层区分“缺 Schema 部署”与“报文畸形”。
        let registry = registry_with_stubs();
        let encode_ctx = crate::component::EncodeContext::new(&registry);
        let command = Command::new(StubCheckCommand::with_names(["a.example"]))
            .with_extension(Box::new(MarkerExtension::with_token("t-1")));
        let encoded = command.encode(&encode_ctx).expect("encode succeeds");

        // How: 解码侧的注册中心只认识映射、不认识扩展命名空间。
        let mut lonely = ExtensionRegistry::new();
        lonely.register_mapping(Box::new(NoopMappingFactory::new(STUB_NS)));
        let decode_ctx = DecodeContext::new(&lonely);
        let err = decode_command(&encoded, &decode_ctx).unwrap_err();
        assert_eq!(
            err.component_not_found_kind(),
            Some(crate::error::NotFoundKind::Extension)
        );
    }

    #[test]
    fn duplicate_extensions_follow_the_configured_policy() {
        let registry = registry_with_stubs();
        let encode_ctx = crate::component::EncodeContext::new(&registry);
        let command = Command::new(StubCheckCommand::with_names(["a.example"]))
            .with_extension(Box::new(MarkerExtension::with_token("first")))
            .with_extension(Box::new(MarkerExtension::with_token("second")));
        let encoded = command.encode(&encode_ctx).expect("encode succeeds");

        // 默认策略：保留全部实例且维持文档顺序，严格查询才报重复。
        let relaxed = DecodeContext::new(&registry);
        let decoded = decode_command(&encoded, &relaxed).expect("decode succeeds");
        let tokens: alloc::vec::Vec<&str> = decoded
            .extensions()
            .iter()
            .filter_map(|extension| extension.as_any().downcast_ref::<MarkerExtension>())
            .map(MarkerExtension::token)
            .collect();
        assert_eq!(tokens, ["first", "second"]);
        let err = decoded.find_unique_extension::<MarkerExtension>().unwrap_err();
        assert_eq!(err.code(), codes::EXTENSION_DUPLICATE);

        // Reject 策略：解码期直接失败。
        let strict_config = CodecConfig {
            duplicate_extensions: DuplicatePolicy::Reject,
        };
        let strict = DecodeContext::with_config(&registry, strict_config);
        let err = decode_command(&encoded, &strict).unwrap_err();
        assert_eq!(err.code(), codes::EXTENSION_DUPLICATE);
    }

    #[test]
    fn duplicate_is_a_deep_copy() {
        // Why: 副本交给并发上下文使用，扩展列表共享会破坏单写者假设。
        let command = Command::new(StubCheckCommand::with_names(["a.example"]))
            .with_extension(Box::new(MarkerExtension::with_token("t-1")));
        let copy = command.duplicate();
        assert_eq!(copy.extensions().len(), 1);
        let original = command.find_extension::<MarkerExtension>().unwrap();
        let cloned = copy.find_extension::<MarkerExtension>().unwrap();
        assert_eq!(original.token(), cloned.token());
        assert!(!core::ptr::eq(original, cloned));
    }
}
