//! EPP 编解码错误域：稳定错误码、根因链路与分类查询都在此发布。
//!
//! # 设计目标（Why）
//! - 编码失败、解码失败与“工厂缺失”属于截然不同的处置路径：前两者指向调用方数据缺陷，
//!   后者指向部署缺失的 Schema；会话层需要依据稳定错误码做出区分。
//! - 框架仍需兼容 `no_std + alloc` 场景，因此不依赖 `std::error::Error`，
//!   而是直接面向 `core::error::Error` 暴露根因链路。
//!
//! # 使用方式（How）
//! - 所有错误码集中在 [`codes`] 模块，遵循 `<域>.<语义>` 命名；
//! - 通过 [`EppError::component_not_found_kind`] 可以在不解析字符串的情况下
//!   判断“组件未注册”错误来自命令、响应还是扩展的解析路径。

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use core::fmt;

/// crate 级 `Result` 别名，错误类型默认为 [`EppError`]。
pub type Result<T, E = EppError> = core::result::Result<T, E>;

/// 稳定错误码注册表。
///
/// # 契约说明（What）
/// - 每个常量都是跨版本稳定的机读标识，日志、指标与测试断言只允许引用这里的常量；
/// - 新增错误码必须同步补充 `component_not_found_kind` 等分类查询的映射。
pub mod codes {
    /// 编码时缺失必填属性或子元素。
    pub const ENCODE_MISSING_ATTRIBUTE: &str = "epp.encode.missing_attribute";
    /// 编码时属性取值超出协议允许的范围（长度、数量、枚举值等）。
    pub const ENCODE_OUT_OF_RANGE: &str = "epp.encode.out_of_range";
    /// 解码时遇到缺失、错位或无法解析的元素。
    pub const DECODE_MALFORMED: &str = "epp.decode.malformed";
    /// 解码时属性取值超出协议允许的范围。
    pub const DECODE_OUT_OF_RANGE: &str = "epp.decode.out_of_range";
    /// 命令映射命名空间未注册任何工厂。
    pub const COMPONENT_NOT_FOUND_COMMAND: &str = "epp.decode.component_not_found.command";
    /// 响应映射命名空间未注册任何工厂。
    pub const COMPONENT_NOT_FOUND_RESPONSE: &str = "epp.decode.component_not_found.response";
    /// 扩展块内出现未注册命名空间的元素。
    pub const COMPONENT_NOT_FOUND_EXTENSION: &str = "epp.decode.component_not_found.extension";
    /// 同一扩展类型出现多份实例，且调用方或配置要求唯一。
    pub const EXTENSION_DUPLICATE: &str = "epp.extension.duplicate";
    /// XML 文本读取失败（仅 `std` Feature 下的文本层使用）。
    pub const XML_READ: &str = "epp.xml.read";
    /// XML 文本写出失败（仅 `std` Feature 下的文本层使用）。
    pub const XML_WRITE: &str = "epp.xml.write";
}

/// “组件未注册”错误的来源路径。
///
/// # 设计背景（Why）
/// - 解码器在三个位置依赖注册中心：命令映射、响应映射与扩展块；
/// - 会话层需要区分“缺 Schema 部署”发生在哪条路径上，才能决定是拒绝会话还是仅丢弃扩展。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotFoundKind {
    /// 命令解码路径：`create_command` 未找到映射工厂。
    Command,
    /// 响应解码路径：`create_response` 未找到映射工厂。
    Response,
    /// 扩展解码路径：`create_extension` 未找到扩展工厂。
    Extension,
}

impl NotFoundKind {
    /// 对应的稳定错误码。
    pub fn code(self) -> &'static str {
        match self {
            NotFoundKind::Command => codes::COMPONENT_NOT_FOUND_COMMAND,
            NotFoundKind::Response => codes::COMPONENT_NOT_FOUND_RESPONSE,
            NotFoundKind::Extension => codes::COMPONENT_NOT_FOUND_EXTENSION,
        }
    }

    /// 人类可读标签，用于拼接诊断消息。
    fn label(self) -> &'static str {
        match self {
            NotFoundKind::Command => "command",
            NotFoundKind::Response => "response",
            NotFoundKind::Extension => "extension",
        }
    }
}

/// `EppError` 是编解码层所有可观察错误的最终形态。
///
/// # 设计背景（Why）
/// - 编码、解码与注册中心在不同层次产生的故障需要合流为统一的错误码，
///   以便会话层做精确的自动化处置（重试、回报服务器错误响应或终止会话）。
///
/// # 契约说明（What）
/// - `code`：`'static` 稳定字符串，承载机读语义；
/// - `message`：面向排障人员的自然语言描述，命名出错的属性或元素；
/// - `cause`：可选底层原因，通过 `source()` 暴露完整链路。
///
/// # 行为逻辑（How）
/// - 构造后以 Builder 风格方法叠加根因；
/// - 所有错误对单次 encode/decode 调用都是致命的，内部绝不重试；
///   失败后正在构造的对象必须被丢弃。
///
/// # 风险提示（Trade-offs）
/// - 消息采用 `Cow<'static, str>`，动态拼接时付出一次堆分配，换取静态文案零开销。
#[derive(Debug)]
pub struct EppError {
    code: &'static str,
    message: Cow<'static, str>,
    cause: Option<Box<dyn core::error::Error + Send + Sync>>,
}

impl EppError {
    /// 构造携带稳定错误码的错误。
    pub fn new(code: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// 附带底层原因并返回新的错误。
    pub fn with_cause(mut self, cause: impl core::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// 编码路径：必填属性或子元素缺失。
    ///
    /// 错误消息始终点名缺失的属性，满足“编码失败必须命名出错字段”的契约。
    pub fn missing_attribute(attribute: &'static str) -> Self {
        Self::new(
            codes::ENCODE_MISSING_ATTRIBUTE,
            format!("required attribute `{attribute}` is missing"),
        )
    }

    /// 解码路径：元素缺失、错位或无法解析。
    pub fn malformed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(codes::DECODE_MALFORMED, message)
    }

    /// 注册中心查询失败：给定命名空间没有绑定工厂。
    pub fn component_not_found(kind: NotFoundKind, namespace: &str) -> Self {
        Self::new(
            kind.code(),
            format!(
                "no {} factory registered for namespace `{namespace}`",
                kind.label()
            ),
        )
    }

    /// 扩展唯一性检查失败：同一类型/命名空间的扩展出现多份。
    pub fn duplicate_extension(namespace: &str) -> Self {
        Self::new(
            codes::EXTENSION_DUPLICATE,
            format!("more than one extension present for namespace `{namespace}`"),
        )
    }

    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// 人类可读消息。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 可选的底层原因。
    pub fn cause(&self) -> Option<&(dyn core::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// 是否属于编码错误域（`epp.encode.*`）。
    pub fn is_encode(&self) -> bool {
        self.code.starts_with("epp.encode.")
    }

    /// 是否属于解码错误域（`epp.decode.*`）。
    pub fn is_decode(&self) -> bool {
        self.code.starts_with("epp.decode.")
    }

    /// 若为“组件未注册”错误，返回其来源路径。
    ///
    /// # 契约说明（What）
    /// - 查询不修改内部状态，可多次调用；
    /// - 非 `component_not_found` 系错误一律返回 `None`，调用方不得以消息文本兜底判断。
    pub fn component_not_found_kind(&self) -> Option<NotFoundKind> {
        match self.code {
            codes::COMPONENT_NOT_FOUND_COMMAND => Some(NotFoundKind::Command),
            codes::COMPONENT_NOT_FOUND_RESPONSE => Some(NotFoundKind::Response),
            codes::COMPONENT_NOT_FOUND_EXTENSION => Some(NotFoundKind::Extension),
            _ => None,
        }
    }
}

impl fmt::Display for EppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl core::error::Error for EppError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn core::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_kind_round_trips_through_code() {
        // Why: 会话层依赖 `component_not_found_kind` 区分缺失 Schema 的来源，
        //      三种路径必须与错误码一一对应。
        for kind in [
            NotFoundKind::Command,
            NotFoundKind::Response,
            NotFoundKind::Extension,
        ] {
            let err = EppError::component_not_found(kind, "urn:example:ns");
            assert_eq!(err.component_not_found_kind(), Some(kind));
            assert!(err.is_decode());
        }
    }

    #[test]
    fn missing_attribute_names_the_field() {
        // Why: 编码错误必须点名缺失属性，测试防止消息模板在重构中丢失字段名。
        let err = EppError::missing_attribute("clTRID");
        assert_eq!(err.code(), codes::ENCODE_MISSING_ATTRIBUTE);
        assert!(err.message().contains("clTRID"));
        assert!(err.is_encode());
    }

    #[test]
    fn display_carries_code_and_message() {
        let err = EppError::malformed("unexpected element");
        let rendered = alloc::format!("{err}");
        assert!(rendered.contains(codes::DECODE_MALFORMED));
        assert!(rendered.contains("unexpected element"));
    }
}
