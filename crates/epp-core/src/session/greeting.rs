//! 服务端问候语：连接建立时公布的服务菜单与数据收集策略。
//!
//! # 设计目标（Why）
//! - 问候语是协商算法的“服务端一侧”：版本、语言与服务集合在这里公布，
//!   Login 命令据此裁剪自身能力（见 [`super::LoginCommand`]）；
//! - 数据收集策略（dcp）取值全部是封闭枚举，建模为 Rust 枚举后，
//!   非法取值在解码期即被拒绝，而不是流入业务层。

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::component::{Component, DecodeContext, EncodeContext};
use crate::error::{EppError, Result};
use crate::message::Message;
use crate::xml::{Element, ns};

/// 服务菜单：问候语公布、Login 申请的能力集合。
///
/// # 契约说明（What）
/// - 四个列表都保持声明顺序；
/// - `supports_*` 查询是顺序无关的成员判断，服务子集律建立在其上。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceMenu {
    versions: Vec<String>,
    languages: Vec<String>,
    services: Vec<String>,
    extension_services: Vec<String>,
}

impl ServiceMenu {
    /// 构造空菜单。
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder：公布一个协议版本。
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.versions.push(version.into());
        self
    }

    /// Builder：公布一种响应语言。
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.push(language.into());
        self
    }

    /// Builder：公布一个对象服务命名空间。
    pub fn with_service(mut self, namespace: impl Into<String>) -> Self {
        self.services.push(namespace.into());
        self
    }

    /// Builder：公布一个扩展服务命名空间。
    pub fn with_extension_service(mut self, namespace: impl Into<String>) -> Self {
        self.extension_services.push(namespace.into());
        self
    }

    /// 公布的协议版本序列。
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// 公布的语言序列。
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// 公布的对象服务命名空间序列。
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// 公布的扩展服务命名空间序列。
    pub fn extension_services(&self) -> &[String] {
        &self.extension_services
    }

    /// 是否公布了给定协议版本。
    pub fn supports_version(&self, version: &str) -> bool {
        self.versions.iter().any(|candidate| candidate == version)
    }

    /// 是否公布了给定语言。
    pub fn supports_language(&self, language: &str) -> bool {
        self.languages.iter().any(|candidate| candidate == language)
    }

    /// 是否公布了给定对象服务。
    pub fn supports_service(&self, namespace: &str) -> bool {
        self.services.iter().any(|candidate| candidate == namespace)
    }

    /// 是否公布了给定扩展服务。
    pub fn supports_extension_service(&self, namespace: &str) -> bool {
        self.extension_services
            .iter()
            .any(|candidate| candidate == namespace)
    }
}

/// 数据收集策略的访问级别。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DcpAccess {
    /// 可访问全部已收集数据。
    All,
    /// 不提供访问。
    None,
    /// 数据不被持久化。
    Null,
    /// 可访问个人数据。
    Personal,
    /// 可访问个人及其他数据。
    PersonalAndOther,
    /// 可访问其他数据。
    Other,
}

impl DcpAccess {
    fn tag(self) -> &'static str {
        match self {
            DcpAccess::All => "all",
            DcpAccess::None => "none",
            DcpAccess::Null => "null",
            DcpAccess::Personal => "personal",
            DcpAccess::PersonalAndOther => "personalAndOther",
            DcpAccess::Other => "other",
        }
    }

    fn parse(tag: &str) -> Result<Self> {
        match tag {
            "all" => Ok(DcpAccess::All),
            "none" => Ok(DcpAccess::None),
            "null" => Ok(DcpAccess::Null),
            "personal" => Ok(DcpAccess::Personal),
            "personalAndOther" => Ok(DcpAccess::PersonalAndOther),
            "other" => Ok(DcpAccess::Other),
            other => Err(EppError::malformed(format!(
                "`{other}` is not a dcp access value"
            ))),
        }
    }
}

/// 数据收集目的。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DcpPurpose {
    /// 管理目的。
    Admin,
    /// 联络目的。
    Contact,
    /// 其他目的。
    Other,
    /// 对象供给目的。
    Prov,
}

impl DcpPurpose {
    fn tag(self) -> &'static str {
        match self {
            DcpPurpose::Admin => "admin",
            DcpPurpose::Contact => "contact",
            DcpPurpose::Other => "other",
            DcpPurpose::Prov => "prov",
        }
    }

    fn parse(tag: &str) -> Result<Self> {
        match tag {
            "admin" => Ok(DcpPurpose::Admin),
            "contact" => Ok(DcpPurpose::Contact),
            "other" => Ok(DcpPurpose::Other),
            "prov" => Ok(DcpPurpose::Prov),
            other => Err(EppError::malformed(format!(
                "`{other}` is not a dcp purpose value"
            ))),
        }
    }
}

/// 数据接收方类别。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DcpRecipient {
    /// 其他接收方。
    Other,
    /// 服务方自身。
    Ours,
    /// 公开可得。
    Public,
    /// 同类从业方。
    Same,
    /// 无关联第三方。
    Unrelated,
}

impl DcpRecipient {
    fn tag(self) -> &'static str {
        match self {
            DcpRecipient::Other => "other",
            DcpRecipient::Ours => "ours",
            DcpRecipient::Public => "public",
            DcpRecipient::Same => "same",
            DcpRecipient::Unrelated => "unrelated",
        }
    }

    fn parse(tag: &str) -> Result<Self> {
        match tag {
            "other" => Ok(DcpRecipient::Other),
            "ours" => Ok(DcpRecipient::Ours),
            "public" => Ok(DcpRecipient::Public),
            "same" => Ok(DcpRecipient::Same),
            "unrelated" => Ok(DcpRecipient::Unrelated),
            other => Err(EppError::malformed(format!(
                "`{other}` is not a dcp recipient value"
            ))),
        }
    }
}

/// 数据保留策略。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DcpRetention {
    /// 按业务惯例保留。
    Business,
    /// 无限期保留。
    Indefinite,
    /// 按法律要求保留。
    Legal,
    /// 不保留。
    None,
    /// 按声明期限保留。
    Stated,
}

impl DcpRetention {
    fn tag(self) -> &'static str {
        match self {
            DcpRetention::Business => "business",
            DcpRetention::Indefinite => "indefinite",
            DcpRetention::Legal => "legal",
            DcpRetention::None => "none",
            DcpRetention::Stated => "stated",
        }
    }

    fn parse(tag: &str) -> Result<Self> {
        match tag {
            "business" => Ok(DcpRetention::Business),
            "indefinite" => Ok(DcpRetention::Indefinite),
            "legal" => Ok(DcpRetention::Legal),
            "none" => Ok(DcpRetention::None),
            "stated" => Ok(DcpRetention::Stated),
            other => Err(EppError::malformed(format!(
                "`{other}` is not a dcp retention value"
            ))),
        }
    }
}

/// 策略失效期：绝对时间点或相对时长。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DcpExpiry {
    /// 绝对失效时间。
    Absolute(DateTime<Utc>),
    /// 相对失效时长（保留 `xsd:duration` 字面量）。
    Relative(String),
}

/// 一条数据收集声明。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DcpStatement {
    purposes: Vec<DcpPurpose>,
    recipients: Vec<DcpRecipient>,
    retention: DcpRetention,
}

impl DcpStatement {
    /// 以保留策略构造声明。
    pub fn new(retention: DcpRetention) -> Self {
        Self {
            purposes: Vec::new(),
            recipients: Vec::new(),
            retention,
        }
    }

    /// Builder：追加一个收集目的。
    pub fn with_purpose(mut self, purpose: DcpPurpose) -> Self {
        self.purposes.push(purpose);
        self
    }

    /// Builder：追加一个接收方类别。
    pub fn with_recipient(mut self, recipient: DcpRecipient) -> Self {
        self.recipients.push(recipient);
        self
    }

    /// 收集目的序列。
    pub fn purposes(&self) -> &[DcpPurpose] {
        &self.purposes
    }

    /// 接收方类别序列。
    pub fn recipients(&self) -> &[DcpRecipient] {
        &self.recipients
    }

    /// 保留策略。
    pub fn retention(&self) -> DcpRetention {
        self.retention
    }
}

/// 数据收集策略块。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataCollectionPolicy {
    access: DcpAccess,
    statements: Vec<DcpStatement>,
    expiry: Option<DcpExpiry>,
}

impl DataCollectionPolicy {
    /// 以访问级别构造策略。
    pub fn new(access: DcpAccess) -> Self {
        Self {
            access,
            statements: Vec::new(),
            expiry: None,
        }
    }

    /// Builder：追加一条声明。
    pub fn with_statement(mut self, statement: DcpStatement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Builder：设置失效期。
    pub fn with_expiry(mut self, expiry: DcpExpiry) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// 访问级别。
    pub fn access(&self) -> DcpAccess {
        self.access
    }

    /// 声明序列。
    pub fn statements(&self) -> &[DcpStatement] {
        &self.statements
    }

    /// 失效期。
    pub fn expiry(&self) -> Option<&DcpExpiry> {
        self.expiry.as_ref()
    }

    fn encode(&self) -> Result<Element> {
        if self.statements.is_empty() {
            return Err(EppError::missing_attribute("dcp statement"));
        }
        let mut dcp = Element::new(ns::EPP, "dcp").with_child(
            Element::new(ns::EPP, "access").with_child(Element::new(ns::EPP, self.access.tag())),
        );
        for statement in &self.statements {
            if statement.purposes.is_empty() {
                return Err(EppError::missing_attribute("dcp purpose"));
            }
            if statement.recipients.is_empty() {
                return Err(EppError::missing_attribute("dcp recipient"));
            }
            let purpose = Element::new(ns::EPP, "purpose").with_children(
                statement
                    .purposes
                    .iter()
                    .map(|p| Element::new(ns::EPP, p.tag())),
            );
            let recipient = Element::new(ns::EPP, "recipient").with_children(
                statement
                    .recipients
                    .iter()
                    .map(|r| Element::new(ns::EPP, r.tag())),
            );
            let retention = Element::new(ns::EPP, "retention")
                .with_child(Element::new(ns::EPP, statement.retention.tag()));
            dcp.push_child(
                Element::new(ns::EPP, "statement")
                    .with_child(purpose)
                    .with_child(recipient)
                    .with_child(retention),
            );
        }
        if let Some(expiry) = &self.expiry {
            let inner = match expiry {
                DcpExpiry::Absolute(date) => Element::new(ns::EPP, "absolute")
                    .with_text(date.to_rfc3339_opts(SecondsFormat::Secs, true)),
                DcpExpiry::Relative(duration) => {
                    Element::new(ns::EPP, "relative").with_text(duration.clone())
                }
            };
            dcp.push_child(Element::new(ns::EPP, "expiry").with_child(inner));
        }
        Ok(dcp)
    }

    fn decode(element: &Element) -> Result<Self> {
        let access = element
            .require_child(ns::EPP, "access")?
            .first_child()
            .ok_or_else(|| EppError::malformed("dcp access carries no value"))?;
        let mut policy = DataCollectionPolicy::new(DcpAccess::parse(access.local_name())?);

        for statement in element.children_named(ns::EPP, "statement") {
            let mut decoded = DcpStatement::new(DcpRetention::parse(
                statement
                    .require_child(ns::EPP, "retention")?
                    .first_child()
                    .ok_or_else(|| EppError::malformed("dcp retention carries no value"))?
                    .local_name(),
            )?);
            for purpose in statement.require_child(ns::EPP, "purpose")?.children() {
                decoded.purposes.push(DcpPurpose::parse(purpose.local_name())?);
            }
            for recipient in statement.require_child(ns::EPP, "recipient")?.children() {
                decoded
                    .recipients
                    .push(DcpRecipient::parse(recipient.local_name())?);
            }
            policy.statements.push(decoded);
        }
        if policy.statements.is_empty() {
            return Err(EppError::malformed("dcp carries no statement"));
        }

        if let Some(expiry) = element.child(ns::EPP, "expiry") {
            let inner = expiry
                .first_child()
                .ok_or_else(|| EppError::malformed("dcp expiry carries no value"))?;
            let decoded = match inner.local_name() {
                "absolute" => {
                    let text = inner.require_text()?;
                    let parsed = DateTime::parse_from_rfc3339(text).map_err(|err| {
                        EppError::malformed(format!(
                            "dcp absolute expiry `{text}` is not RFC 3339: {err}"
                        ))
                    })?;
                    DcpExpiry::Absolute(parsed.with_timezone(&Utc))
                }
                "relative" => DcpExpiry::Relative(inner.require_text()?.to_owned()),
                other => {
                    return Err(EppError::malformed(format!(
                        "`{other}` is not a dcp expiry form"
                    )));
                }
            };
            policy.expiry = Some(decoded);
        }
        Ok(policy)
    }
}

/// 服务端问候语。
///
/// # 契约说明（What）
/// - `server_id` 与服务菜单的版本、语言、对象服务在编码期都不得为空；
/// - 服务端时间统一使用 UTC，线上格式为 RFC 3339。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Greeting {
    server_id: String,
    server_date: DateTime<Utc>,
    service_menu: ServiceMenu,
    policy: Option<DataCollectionPolicy>,
}

impl Default for Greeting {
    fn default() -> Self {
        Self {
            server_id: String::new(),
            server_date: DateTime::<Utc>::UNIX_EPOCH,
            service_menu: ServiceMenu::default(),
            policy: None,
        }
    }
}

impl Greeting {
    /// 以服务端身份、时间与服务菜单构造问候语。
    pub fn new(
        server_id: impl Into<String>,
        server_date: DateTime<Utc>,
        service_menu: ServiceMenu,
    ) -> Self {
        Self {
            server_id: server_id.into(),
            server_date,
            service_menu,
            policy: None,
        }
    }

    /// Builder：附带数据收集策略。
    pub fn with_policy(mut self, policy: DataCollectionPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// 服务端身份标识。
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// 服务端当前时间。
    pub fn server_date(&self) -> DateTime<Utc> {
        self.server_date
    }

    /// 公布的服务菜单。
    pub fn service_menu(&self) -> &ServiceMenu {
        &self.service_menu
    }

    /// 数据收集策略。
    pub fn policy(&self) -> Option<&DataCollectionPolicy> {
        self.policy.as_ref()
    }
}

impl Component for Greeting {
    fn encode(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.server_id.is_empty() {
            return Err(EppError::missing_attribute("svID"));
        }
        let menu = &self.service_menu;
        if menu.versions().is_empty() {
            return Err(EppError::missing_attribute("version"));
        }
        if menu.languages().is_empty() {
            return Err(EppError::missing_attribute("lang"));
        }
        if menu.services().is_empty() {
            return Err(EppError::missing_attribute("objURI"));
        }

        let mut svc_menu = Element::new(ns::EPP, "svcMenu")
            .with_children(
                menu.versions()
                    .iter()
                    .map(|v| Element::new(ns::EPP, "version").with_text(v.clone())),
            )
            .with_children(
                menu.languages()
                    .iter()
                    .map(|l| Element::new(ns::EPP, "lang").with_text(l.clone())),
            )
            .with_children(
                menu.services()
                    .iter()
                    .map(|s| Element::new(ns::EPP, "objURI").with_text(s.clone())),
            );
        if !menu.extension_services().is_empty() {
            svc_menu.push_child(
                Element::new(ns::EPP, "svcExtension").with_children(
                    menu.extension_services()
                        .iter()
                        .map(|s| Element::new(ns::EPP, "extURI").with_text(s.clone())),
                ),
            );
        }

        let mut greeting = Element::new(ns::EPP, "greeting")
            .with_child(Element::new(ns::EPP, "svID").with_text(self.server_id.clone()))
            .with_child(
                Element::new(ns::EPP, "svDate")
                    .with_text(self.server_date.to_rfc3339_opts(SecondsFormat::Secs, true)),
            )
            .with_child(svc_menu);
        if let Some(policy) = &self.policy {
            greeting.push_child(policy.encode()?);
        }
        Ok(Element::new(ns::EPP, "epp").with_child(greeting))
    }

    fn decode(&mut self, element: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let greeting = element.require_child(ns::EPP, "greeting")?;
        self.server_id = greeting.require_child_text(ns::EPP, "svID")?.to_owned();

        let date_text = greeting.require_child_text(ns::EPP, "svDate")?;
        self.server_date = DateTime::parse_from_rfc3339(date_text)
            .map_err(|err| {
                EppError::malformed(format!("svDate `{date_text}` is not RFC 3339: {err}"))
            })?
            .with_timezone(&Utc);

        let menu = greeting.require_child(ns::EPP, "svcMenu")?;
        let mut service_menu = ServiceMenu::new();
        for version in menu.children_named(ns::EPP, "version") {
            service_menu.versions.push(version.require_text()?.to_owned());
        }
        for language in menu.children_named(ns::EPP, "lang") {
            service_menu.languages.push(language.require_text()?.to_owned());
        }
        for service in menu.children_named(ns::EPP, "objURI") {
            service_menu.services.push(service.require_text()?.to_owned());
        }
        if let Some(extension) = menu.child(ns::EPP, "svcExtension") {
            for service in extension.children_named(ns::EPP, "extURI") {
                service_menu
                    .extension_services
                    .push(service.require_text()?.to_owned());
            }
        }
        if service_menu.versions.is_empty() {
            return Err(EppError::malformed("svcMenu advertises no version"));
        }
        self.service_menu = service_menu;

        self.policy = match greeting.child(ns::EPP, "dcp") {
            Some(dcp) => Some(DataCollectionPolicy::decode(dcp)?),
            None => None,
        };
        Ok(())
    }

    fn duplicate(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }
}

impl Message for Greeting {
    fn namespace(&self) -> &str {
        ns::EPP
    }
}

/// 解码入口：从 `<epp>` 根元素恢复问候语。
pub fn decode_greeting(root: &Element, ctx: &DecodeContext<'_>) -> Result<Greeting> {
    let mut greeting = Greeting::default();
    greeting.decode(root, ctx)?;
    Ok(greeting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ExtensionRegistry;

    fn sample_menu() -> ServiceMenu {
        ServiceMenu::new()
            .with_version("1.0")
            .with_language("en")
            .with_language("fr")
            .with_service("urn:example:alpha-1.0")
            .with_service("urn:example:beta-1.0")
            .with_extension_service("urn:example:marker-1.0")
    }

    #[test]
    fn greeting_round_trips_with_policy() {
        // Why: 问候语是协商的输入，任何字段在往返中丢失都会让协商给出错误结论。
        let registry = ExtensionRegistry::new();
        let encode_ctx = EncodeContext::new(&registry);
        let decode_ctx = DecodeContext::new(&registry);

        let date = DateTime::parse_from_rfc3339("2026-08-06T09:30:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        let greeting = Greeting::new("registry.example", date, sample_menu()).with_policy(
            DataCollectionPolicy::new(DcpAccess::All)
                .with_statement(
                    DcpStatement::new(DcpRetention::Stated)
                        .with_purpose(DcpPurpose::Admin)
                        .with_purpose(DcpPurpose::Prov)
                        .with_recipient(DcpRecipient::Ours)
                        .with_recipient(DcpRecipient::Public),
                )
                .with_expiry(DcpExpiry::Relative(String::from("P1M"))),
        );

        let encoded = greeting.encode(&encode_ctx).expect("encode succeeds");
        let decoded = decode_greeting(&encoded, &decode_ctx).expect("decode succeeds");
        assert_eq!(decoded, greeting);
    }

    #[test]
    fn empty_server_id_fails_encode() {
        let registry = ExtensionRegistry::new();
        let ctx = EncodeContext::new(&registry);
        let greeting = Greeting::new("", DateTime::<Utc>::UNIX_EPOCH, sample_menu());
        let err = greeting.encode(&ctx).unwrap_err();
        assert_eq!(err.code(), crate::error::codes::ENCODE_MISSING_ATTRIBUTE);
        assert!(err.message().contains("svID"));
    }

    #[test]
    fn menu_without_object_service_fails_encode() {
        let registry = ExtensionRegistry::new();
        let ctx = EncodeContext::new(&registry);
        let menu = ServiceMenu::new().with_version("1.0").with_language("en");
        let greeting = Greeting::new("registry.example", DateTime::<Utc>::UNIX_EPOCH, menu);
        let err = greeting.encode(&ctx).unwrap_err();
        assert!(err.message().contains("objURI"));
    }

    #[test]
    fn unknown_dcp_value_is_malformed() {
        let element = Element::new(ns::EPP, "dcp")
            .with_child(
                Element::new(ns::EPP, "access").with_child(Element::new(ns::EPP, "everything")),
            )
            .with_child(Element::new(ns::EPP, "statement"));
        let err = DataCollectionPolicy::decode(&element).unwrap_err();
        assert_eq!(err.code(), crate::error::codes::DECODE_MALFORMED);
    }
}
