#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![doc = "epp-codec-host: 主机对象映射，`epp-core` 编解码契约的机械应用。"]

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
    HostCheckCommand, HostCreateCommand, HostDeleteCommand, HostInfoCommand, HostUpdateCommand,
    HostUpdateGroup, MAX_CHECK_NAMES,
};
pub use response::{HostCheckData, HostCheckItem, HostCreateData, HostInfoData};
pub use types::{AddressFamily, HostAddress, HostStatusKind};

/// 主机映射命名空间 URI。
pub const NS: &str = "urn:ietf:params:xml:ns:host-1.0";
/// 主机映射的 `xsi:schemaLocation` 取值。
pub const SCHEMA_LOCATION: &str = "urn:ietf:params:xml:ns:host-1.0 host-1.0.xsd";

/// 构造携带 Schema 位置声明的映射根元素。
pub(crate) fn mapping_element(local: &'static str) -> Element {
    Element::new(NS, local).with_attribute(epp_ns::SCHEMA_LOCATION_ATTR, SCHEMA_LOCATION)
}

/// 主机映射工厂。
#[derive(Debug)]
pub struct HostMapping {
    descriptor: ServiceDescriptor,
}

impl Default for HostMapping {
    fn default() -> Self {
        Self {
            descriptor: ServiceDescriptor::new("host", NS, SCHEMA_LOCATION),
        }
    }
}

impl HostMapping {
    /// 构造工厂实例。
    pub fn new() -> Self {
        Self::default()
    }
}

impl MappingFactory for HostMapping {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn create_command(&self, element: &Element) -> Result<Command> {
        let payload: Box<dyn CommandPayload> = match CommandKind::from_tag(element.local_name()) {
            Some(CommandKind::Check) => Box::new(HostCheckCommand::default()),
            Some(CommandKind::Info) => Box::new(HostInfoCommand::default()),
            Some(CommandKind::Create) => Box::new(HostCreateCommand::default()),
            Some(CommandKind::Delete) => Box::new(HostDeleteCommand::default()),
            Some(CommandKind::Update) => Box::new(HostUpdateCommand::default()),
            _ => {
                return Err(EppError::malformed(format!(
                    "`{}` is not a host mapping command",
                    element.local_name()
                )));
            }
        };
        Ok(Command::from_boxed(payload))
    }

    fn create_response(&self, element: &Element) -> Result<Response> {
        response::shell_for(element).ok_or_else(|| {
            EppError::malformed(format!(
                "`{}` is not a host mapping response",
                element.local_name()
            ))
        })
    }
}
