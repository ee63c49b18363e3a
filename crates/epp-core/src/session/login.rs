//! 会话建立命令：Login 与 Logout。
//!
//! # 设计目标（Why）
//! - Login 是协商算法的“客户端一侧”：默认携带本地注册中心公布的全部能力，
//!   再依据问候语校验（子集律）或裁剪（归并律）；
//! - 两条定律都收敛在本模块，会话层不需要重复实现集合判断。
//!
//! # 契约说明（What）
//! - `is_valid_against_greeting`：版本 ∈ 菜单版本 ∧ 语言 ∈ 菜单语言 ∧
//!   对象服务 ⊆ 菜单对象服务（顺序无关）；
//! - `merge_with_greeting`：破坏性地将两个服务集合与菜单求交，
//!   归并后子集律必然成立。

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use crate::command::{CommandKind, CommandPayload};
use crate::component::{DecodeContext, EncodeContext};
use crate::error::{EppError, Result, codes};
use crate::registry::ExtensionRegistry;
use crate::session::Greeting;
use crate::xml::{Element, ns};

/// 本实现支持的唯一协议版本。
pub const PROTOCOL_VERSION: &str = "1.0";
/// 未显式指定时的默认响应语言。
pub const DEFAULT_LANGUAGE: &str = "en";
/// 客户端标识的最小长度（字符数）。
pub const CLIENT_ID_MIN: usize = 3;
/// 客户端标识的最大长度（字符数）。
pub const CLIENT_ID_MAX: usize = 16;
/// 口令的最小长度（字符数）。
pub const PASSWORD_MIN: usize = 6;
/// 口令的最大长度（字符数）。
pub const PASSWORD_MAX: usize = 16;

/// Login 命令载荷。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginCommand {
    client_id: String,
    password: String,
    new_password: Option<String>,
    version: String,
    language: String,
    services: Vec<String>,
    extension_services: Vec<String>,
}

impl Default for LoginCommand {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            password: String::new(),
            new_password: None,
            version: String::from(PROTOCOL_VERSION),
            language: String::from(DEFAULT_LANGUAGE),
            services: Vec::new(),
            extension_services: Vec::new(),
        }
    }
}

impl LoginCommand {
    /// 以注册中心播种的全量能力构造 Login。
    ///
    /// # 行为逻辑（How）
    /// - 对象与扩展服务集合直接取注册中心的枚举结果，
    ///   之后由 [`Self::merge_with_greeting`] 裁剪到双方交集；
    /// - 版本与语言取默认值。
    pub fn new(
        registry: &ExtensionRegistry,
        client_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            password: password.into(),
            services: registry
                .services()
                .map(|descriptor| descriptor.namespace_uri().to_owned())
                .collect(),
            extension_services: registry
                .extension_services()
                .map(|descriptor| descriptor.namespace_uri().to_owned())
                .collect(),
            ..Self::default()
        }
    }

    /// Builder：设置改密口令。
    pub fn with_new_password(mut self, password: impl Into<String>) -> Self {
        self.new_password = Some(password.into());
        self
    }

    /// Builder：设置期望的响应语言。
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Builder：覆盖对象服务集合。
    pub fn with_services(mut self, services: impl IntoIterator<Item = String>) -> Self {
        self.services = services.into_iter().collect();
        self
    }

    /// Builder：覆盖扩展服务集合。
    pub fn with_extension_services(
        mut self,
        services: impl IntoIterator<Item = String>,
    ) -> Self {
        self.extension_services = services.into_iter().collect();
        self
    }

    /// 客户端标识。
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// 当前口令。
    pub fn password(&self) -> &str {
        &self.password
    }

    /// 改密口令。
    pub fn new_password(&self) -> Option<&str> {
        self.new_password.as_deref()
    }

    /// 期望的协议版本。
    pub fn version(&self) -> &str {
        &self.version
    }

    /// 期望的响应语言。
    pub fn language(&self) -> &str {
        &self.language
    }

    /// 申请的对象服务集合。
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// 申请的扩展服务集合。
    pub fn extension_services(&self) -> &[String] {
        &self.extension_services
    }

    /// 子集律：Login 是否可被该问候语的服务端接受。
    pub fn is_valid_against_greeting(&self, greeting: &Greeting) -> bool {
        let menu = greeting.service_menu();
        menu.supports_version(&self.version)
            && menu.supports_language(&self.language)
            && self
                .services
                .iter()
                .all(|service| menu.supports_service(service))
    }

    /// 归并律：把两个服务集合裁剪到与问候语的交集。
    pub fn merge_with_greeting(&mut self, greeting: &Greeting) {
        let menu = greeting.service_menu();
        self.services.retain(|service| menu.supports_service(service));
        self.extension_services
            .retain(|service| menu.supports_extension_service(service));
    }

    fn validate_for_encode(&self) -> Result<()> {
        validate_token("clID", &self.client_id, CLIENT_ID_MIN, CLIENT_ID_MAX)?;
        validate_token("pw", &self.password, PASSWORD_MIN, PASSWORD_MAX)?;
        if let Some(new_password) = &self.new_password {
            validate_token("newPW", new_password, PASSWORD_MIN, PASSWORD_MAX)?;
        }
        if self.version.is_empty() {
            return Err(EppError::missing_attribute("version"));
        }
        if self.language.is_empty() {
            return Err(EppError::missing_attribute("lang"));
        }
        if self.services.is_empty() {
            return Err(EppError::missing_attribute("objURI"));
        }
        Ok(())
    }
}

fn validate_token(attribute: &'static str, value: &str, min: usize, max: usize) -> Result<()> {
    if value.is_empty() {
        return Err(EppError::missing_attribute(attribute));
    }
    let length = value.chars().count();
    if !(min..=max).contains(&length) {
        return Err(EppError::new(
            codes::ENCODE_OUT_OF_RANGE,
            format!("`{attribute}` length {length} is outside [{min}, {max}]"),
        ));
    }
    Ok(())
}

impl CommandPayload for LoginCommand {
    fn namespace(&self) -> &str {
        ns::EPP
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Login
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        self.validate_for_encode()?;

        let options = Element::new(ns::EPP, "options")
            .with_child(Element::new(ns::EPP, "version").with_text(self.version.clone()))
            .with_child(Element::new(ns::EPP, "lang").with_text(self.language.clone()));

        let mut svcs = Element::new(ns::EPP, "svcs").with_children(
            self.services
                .iter()
                .map(|service| Element::new(ns::EPP, "objURI").with_text(service.clone())),
        );
        if !self.extension_services.is_empty() {
            svcs.push_child(
                Element::new(ns::EPP, "svcExtension").with_children(
                    self.extension_services
                        .iter()
                        .map(|service| Element::new(ns::EPP, "extURI").with_text(service.clone())),
                ),
            );
        }

        let mut login = Element::new(ns::EPP, "login")
            .with_child(Element::new(ns::EPP, "clID").with_text(self.client_id.clone()))
            .with_child(Element::new(ns::EPP, "pw").with_text(self.password.clone()));
        if let Some(new_password) = &self.new_password {
            login.push_child(Element::new(ns::EPP, "newPW").with_text(new_password.clone()));
        }
        login.push_child(options);
        login.push_child(svcs);
        Ok(login)
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        self.client_id = verb.require_child_text(ns::EPP, "clID")?.to_owned();
        self.password = verb.require_child_text(ns::EPP, "pw")?.to_owned();
        self.new_password = verb.child_text_owned(ns::EPP, "newPW");

        let options = verb.require_child(ns::EPP, "options")?;
        self.version = options.require_child_text(ns::EPP, "version")?.to_owned();
        self.language = options.require_child_text(ns::EPP, "lang")?.to_owned();

        let svcs = verb.require_child(ns::EPP, "svcs")?;
        self.services = svcs
            .children_named(ns::EPP, "objURI")
            .map(|service| service.require_text().map(ToOwned::to_owned))
            .collect::<Result<Vec<_>>>()?;
        self.extension_services = match svcs.child(ns::EPP, "svcExtension") {
            Some(extension) => extension
                .children_named(ns::EPP, "extURI")
                .map(|service| service.require_text().map(ToOwned::to_owned))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Logout 命令载荷：空动词。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogoutCommand;

impl CommandPayload for LogoutCommand {
    fn namespace(&self) -> &str {
        ns::EPP
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Logout
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        Ok(Element::new(ns::EPP, "logout"))
    }

    fn decode_payload(&mut self, _verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, decode_command};
    use crate::component::Component;
    use crate::session::ServiceMenu;
    use chrono::{DateTime, Utc};

    fn greeting_with(services: &[&str]) -> Greeting {
        let mut menu = ServiceMenu::new().with_version("1.0").with_language("en");
        for service in services {
            menu = menu.with_service(*service);
        }
        Greeting::new("registry.example", DateTime::<Utc>::UNIX_EPOCH, menu)
    }

    fn login_with(services: &[&str]) -> LoginCommand {
        LoginCommand::default()
            .with_services(services.iter().map(|s| String::from(*s)))
    }

    #[test]
    fn subset_law_accepts_contained_service_sets() {
        // Why: 子集律是协商的判定核心——login 服务集包含于菜单即有效。
        let greeting = greeting_with(&[
            "urn:example:domain-1.0",
            "urn:example:host-1.0",
            "urn:example:contact-1.0",
        ]);
        let login = login_with(&["urn:example:domain-1.0", "urn:example:host-1.0"]);
        assert!(login.is_valid_against_greeting(&greeting));
    }

    #[test]
    fn subset_law_rejects_missing_service() {
        let greeting = greeting_with(&["urn:example:domain-1.0"]);
        let login = login_with(&["urn:example:domain-1.0", "urn:example:rgp-1.0"]);
        assert!(!login.is_valid_against_greeting(&greeting));
    }

    #[test]
    fn subset_law_checks_version_and_language() {
        let greeting = greeting_with(&["urn:example:domain-1.0"]);
        let wrong_language = login_with(&["urn:example:domain-1.0"]).with_language("zh");
        assert!(!wrong_language.is_valid_against_greeting(&greeting));
    }

    #[test]
    fn merge_law_establishes_the_subset_invariant() {
        // Why: 归并律的后置条件是“归并后子集律必然成立”，这是两条定律的耦合点。
        let greeting = greeting_with(&["urn:example:domain-1.0"]);
        let mut login = login_with(&["urn:example:domain-1.0", "urn:example:rgp-1.0"]);
        assert!(!login.is_valid_against_greeting(&greeting));
        login.merge_with_greeting(&greeting);
        assert!(login.is_valid_against_greeting(&greeting));
        assert_eq!(login.services(), ["urn:example:domain-1.0"]);
    }

    #[test]
    fn login_round_trips_through_the_envelope() {
        let registry = ExtensionRegistry::new();
        let encode_ctx = EncodeContext::new(&registry);
        let decode_ctx = DecodeContext::new(&registry);

        let login = LoginCommand {
            client_id: String::from("ClientX"),
            password: String::from("foo-BAR2"),
            new_password: Some(String::from("bar-FOO2")),
            version: String::from(PROTOCOL_VERSION),
            language: String::from(DEFAULT_LANGUAGE),
            services: alloc::vec![String::from("urn:example:domain-1.0")],
            extension_services: alloc::vec![String::from("urn:example:marker-1.0")],
        };
        let command = Command::new(login.clone()).with_client_transaction_id("ABC-12345");
        let encoded = command.encode(&encode_ctx).expect("encode succeeds");
        let decoded = decode_command(&encoded, &decode_ctx).expect("decode succeeds");
        let payload = decoded
            .payload_as::<LoginCommand>()
            .expect("login payload survives");
        assert_eq!(*payload, login);
    }

    #[test]
    fn password_bounds_are_enforced_at_encode() {
        let registry = ExtensionRegistry::new();
        let ctx = EncodeContext::new(&registry);
        let login = LoginCommand {
            client_id: String::from("ClientX"),
            password: String::from("tiny"),
            services: alloc::vec![String::from("urn:example:domain-1.0")],
            ..LoginCommand::default()
        };
        let err = login.encode_payload(&ctx).unwrap_err();
        assert_eq!(err.code(), codes::ENCODE_OUT_OF_RANGE);
        assert!(err.message().contains("pw"));
    }

    #[test]
    fn missing_client_id_names_the_attribute() {
        let registry = ExtensionRegistry::new();
        let ctx = EncodeContext::new(&registry);
        let login = LoginCommand {
            password: String::from("foo-BAR2"),
            services: alloc::vec![String::from("urn:example:domain-1.0")],
            ..LoginCommand::default()
        };
        let err = login.encode_payload(&ctx).unwrap_err();
        assert_eq!(err.code(), codes::ENCODE_MISSING_ATTRIBUTE);
        assert!(err.message().contains("clID"));
    }
}
