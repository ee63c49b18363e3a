//! 主机映射的五个命令载荷。

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use epp_core::xml::ns as epp_ns;
use epp_core::{
    CommandKind, CommandPayload, DecodeContext, Element, EncodeContext, EppError, Result, codes,
};

use crate::NS;
use crate::types::{HostAddress, HostStatusKind};

/// check 命令单次可查询的主机数量上限。
pub const MAX_CHECK_NAMES: usize = 99;

/// 主机可用性查询。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostCheckCommand {
    names: Vec<String>,
}

impl HostCheckCommand {
    /// 以名字列表构造。
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// 待查询的名字列表。
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl CommandPayload for HostCheckCommand {
    fn namespace(&self) -> &str {
        NS
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Check
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.names.is_empty() {
            return Err(EppError::missing_attribute("host:name"));
        }
        if self.names.len() > MAX_CHECK_NAMES {
            return Err(EppError::new(
                codes::ENCODE_OUT_OF_RANGE,
                format!(
                    "check command lists {} host names, maximum is {MAX_CHECK_NAMES}",
                    self.names.len()
                ),
            ));
        }
        let mapping = crate::mapping_element("check").with_children(
            self.names
                .iter()
                .map(|name| Element::new(NS, "name").with_text(name.clone())),
        );
        Ok(Element::new(epp_ns::EPP, "check").with_child(mapping))
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let mapping = verb.require_child(NS, "check")?;
        self.names = mapping
            .children_named(NS, "name")
            .map(|name| name.require_text().map(String::from))
            .collect::<Result<Vec<_>>>()?;
        if self.names.is_empty() {
            return Err(EppError::malformed("host check lists no name"));
        }
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 主机详情查询。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostInfoCommand {
    name: String,
}

impl HostInfoCommand {
    /// 以主机名构造。
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// 查询目标主机名。
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CommandPayload for HostInfoCommand {
    fn namespace(&self) -> &str {
        NS
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Info
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("host:name"));
        }
        let mapping = crate::mapping_element("info")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()));
        Ok(Element::new(epp_ns::EPP, "info").with_child(mapping))
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let mapping = verb.require_child(NS, "info")?;
        self.name = mapping.require_child_text(NS, "name")?.into();
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 主机创建。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostCreateCommand {
    name: String,
    addresses: Vec<HostAddress>,
}

impl HostCreateCommand {
    /// 以主机名构造。
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            addresses: Vec::new(),
        }
    }

    /// Builder：追加一个粘连地址。
    pub fn with_address(mut self, address: HostAddress) -> Self {
        self.addresses.push(address);
        self
    }

    /// 主机名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 粘连地址序列。
    pub fn addresses(&self) -> &[HostAddress] {
        &self.addresses
    }
}

impl CommandPayload for HostCreateCommand {
    fn namespace(&self) -> &str {
        NS
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Create
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("host:name"));
        }
        let mut mapping = crate::mapping_element("create")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()));
        for address in &self.addresses {
            mapping.push_child(address.to_element()?);
        }
        Ok(Element::new(epp_ns::EPP, "create").with_child(mapping))
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let mapping = verb.require_child(NS, "create")?;
        self.name = mapping.require_child_text(NS, "name")?.into();
        self.addresses = mapping
            .children_named(NS, "addr")
            .map(HostAddress::from_element)
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 主机删除。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostDeleteCommand {
    name: String,
}

impl HostDeleteCommand {
    /// 以主机名构造。
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// 目标主机名。
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CommandPayload for HostDeleteCommand {
    fn namespace(&self) -> &str {
        NS
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Delete
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("host:name"));
        }
        let mapping = crate::mapping_element("delete")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()));
        Ok(Element::new(epp_ns::EPP, "delete").with_child(mapping))
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let mapping = verb.require_child(NS, "delete")?;
        self.name = mapping.require_child_text(NS, "name")?.into();
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// update 命令的增/删分组：地址与状态值。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostUpdateGroup {
    addresses: Vec<HostAddress>,
    statuses: Vec<HostStatusKind>,
}

impl HostUpdateGroup {
    /// 构造空分组。
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder：追加一个地址。
    pub fn with_address(mut self, address: HostAddress) -> Self {
        self.addresses.push(address);
        self
    }

    /// Builder：追加一个状态值。
    pub fn with_status(mut self, status: HostStatusKind) -> Self {
        self.statuses.push(status);
        self
    }

    /// 分组是否为空。
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.statuses.is_empty()
    }

    /// 地址序列。
    pub fn addresses(&self) -> &[HostAddress] {
        &self.addresses
    }

    /// 状态值序列。
    pub fn statuses(&self) -> &[HostStatusKind] {
        &self.statuses
    }

    fn encode(&self, local: &'static str) -> Result<Element> {
        let mut group = Element::new(NS, local);
        for address in &self.addresses {
            group.push_child(address.to_element()?);
        }
        for status in &self.statuses {
            group.push_child(status.to_element());
        }
        Ok(group)
    }

    fn decode(element: &Element) -> Result<Self> {
        Ok(Self {
            addresses: element
                .children_named(NS, "addr")
                .map(HostAddress::from_element)
                .collect::<Result<Vec<_>>>()?,
            statuses: element
                .children_named(NS, "status")
                .map(HostStatusKind::from_element)
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

/// 主机更新：增/删分组加可选的改名。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostUpdateCommand {
    name: String,
    add: HostUpdateGroup,
    remove: HostUpdateGroup,
    new_name: Option<String>,
}

impl HostUpdateCommand {
    /// 以主机名构造。
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder：设置新增分组。
    pub fn with_add(mut self, add: HostUpdateGroup) -> Self {
        self.add = add;
        self
    }

    /// Builder：设置移除分组。
    pub fn with_remove(mut self, remove: HostUpdateGroup) -> Self {
        self.remove = remove;
        self
    }

    /// Builder：改名。
    pub fn with_new_name(mut self, new_name: impl Into<String>) -> Self {
        self.new_name = Some(new_name.into());
        self
    }

    /// 目标主机名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 新增分组。
    pub fn add(&self) -> &HostUpdateGroup {
        &self.add
    }

    /// 移除分组。
    pub fn remove(&self) -> &HostUpdateGroup {
        &self.remove
    }

    /// 新主机名。
    pub fn new_name(&self) -> Option<&str> {
        self.new_name.as_deref()
    }
}

impl CommandPayload for HostUpdateCommand {
    fn namespace(&self) -> &str {
        NS
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Update
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("host:name"));
        }
        if self.add.is_empty() && self.remove.is_empty() && self.new_name.is_none() {
            return Err(EppError::missing_attribute("host:add/rem/chg"));
        }
        let mut mapping = crate::mapping_element("update")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()));
        if !self.add.is_empty() {
            mapping.push_child(self.add.encode("add")?);
        }
        if !self.remove.is_empty() {
            mapping.push_child(self.remove.encode("rem")?);
        }
        if let Some(new_name) = &self.new_name {
            mapping.push_child(
                Element::new(NS, "chg")
                    .with_child(Element::new(NS, "name").with_text(new_name.clone())),
            );
        }
        Ok(Element::new(epp_ns::EPP, "update").with_child(mapping))
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let mapping = verb.require_child(NS, "update")?;
        self.name = mapping.require_child_text(NS, "name")?.into();
        self.add = match mapping.child(NS, "add") {
            Some(group) => HostUpdateGroup::decode(group)?,
            None => HostUpdateGroup::default(),
        };
        self.remove = match mapping.child(NS, "rem") {
            Some(group) => HostUpdateGroup::decode(group)?,
            None => HostUpdateGroup::default(),
        };
        self.new_name = match mapping.child(NS, "chg") {
            Some(change) => Some(change.require_child_text(NS, "name")?.into()),
            None => None,
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
