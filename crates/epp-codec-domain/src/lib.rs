#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![doc = "epp-codec-domain: 域名对象映射，`epp-core` 编解码契约的机械应用。"]
#![doc = ""]
#![doc = "本 crate 在不触碰核心的前提下实现域名命名空间的七个命令与五个响应数据块，"]
#![doc = "并通过 [`DomainMapping`] 工厂在启动期注册到 `ExtensionRegistry`。"]

extern crate alloc;

use alloc::boxed::Box;
use alloc::format;

use epp_core::xml::ns as epp_ns;
use epp_core::{
    Command, CommandKind, CommandPayload, Element, EppError, MappingFactory, Response, Result,
    ServiceDescriptor,
};

pub mod command;
pub mod response;
pub mod types;

pub use command::{
    DomainChange, DomainCheckCommand, DomainCreateCommand, DomainDeleteCommand, DomainInfoCommand,
    DomainRenewCommand, DomainTransferCommand, DomainUpdateCommand, DomainUpdateGroup,
    MAX_CHECK_NAMES,
};
pub use response::{
    DomainCheckData, DomainCheckItem, DomainCreateData, DomainInfoData, DomainRenewData,
    DomainTransferData,
};
pub use types::{
    AuthInfo, CONTACT_NS, ContactType, DomainContact, DomainStatus, DomainStatusKind, HostsFilter,
    Period, PeriodUnit,
};

/// 域名映射命名空间 URI。
pub const NS: &str = "urn:ietf:params:xml:ns:domain-1.0";
/// 域名映射的 `xsi:schemaLocation` 取值。
pub const SCHEMA_LOCATION: &str = "urn:ietf:params:xml:ns:domain-1.0 domain-1.0.xsd";

/// 构造携带 Schema 位置声明的映射根元素。
pub(crate) fn mapping_element(local: &'static str) -> Element {
    Element::new(NS, local).with_attribute(epp_ns::SCHEMA_LOCATION_ATTR, SCHEMA_LOCATION)
}

/// 域名映射工厂：解码期按元素本地名实例化具体命令/响应。
#[derive(Debug)]
pub struct DomainMapping {
    descriptor: ServiceDescriptor,
}

impl Default for DomainMapping {
    fn default() -> Self {
        Self {
            descriptor: ServiceDescriptor::new("domain", NS, SCHEMA_LOCATION),
        }
    }
}

impl DomainMapping {
    /// 构造工厂实例。
    pub fn new() -> Self {
        Self::default()
    }
}

impl MappingFactory for DomainMapping {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn create_command(&self, element: &Element) -> Result<Command> {
        let payload: Box<dyn CommandPayload> = match CommandKind::from_tag(element.local_name()) {
            Some(CommandKind::Check) => Box::new(DomainCheckCommand::default()),
            Some(CommandKind::Info) => Box::new(DomainInfoCommand::default()),
            Some(CommandKind::Create) => Box::new(DomainCreateCommand::default()),
            Some(CommandKind::Delete) => Box::new(DomainDeleteCommand::default()),
            Some(CommandKind::Renew) => Box::new(DomainRenewCommand::default()),
            Some(CommandKind::Transfer) => Box::new(DomainTransferCommand::default()),
            Some(CommandKind::Update) => Box::new(DomainUpdateCommand::default()),
            _ => {
                return Err(EppError::malformed(format!(
                    "`{}` is not a domain mapping command",
                    element.local_name()
                )));
            }
        };
        Ok(Command::from_boxed(payload))
    }

    fn create_response(&self, element: &Element) -> Result<Response> {
        response::shell_for(element).ok_or_else(|| {
            EppError::malformed(format!(
                "`{}` is not a domain mapping response",
                element.local_name()
            ))
        })
    }
}
