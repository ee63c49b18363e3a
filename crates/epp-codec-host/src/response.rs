//! 主机映射的响应数据块。

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use chrono::{DateTime, Utc};

use epp_core::{
    DecodeContext, Element, EncodeContext, EppError, Response, ResponsePayload, Result,
};

use crate::NS;
use crate::types::{HostAddress, HostStatusKind, format_date_time, parse_date_time};

/// check 响应中的单个查询结论。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostCheckItem {
    name: String,
    available: bool,
    reason: Option<String>,
}

impl HostCheckItem {
    /// 以名字与可用性构造。
    pub fn new(name: impl Into<String>, available: bool) -> Self {
        Self {
            name: name.into(),
            available,
            reason: None,
        }
    }

    /// Builder：附带不可用原因。
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// 被查询的名字。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 是否可创建。
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// 不可用原因。
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

/// check 响应数据（`chkData`）。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostCheckData {
    items: Vec<HostCheckItem>,
}

impl HostCheckData {
    /// 以结论列表构造。
    pub fn new(items: impl IntoIterator<Item = HostCheckItem>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// 查询结论序列。
    pub fn items(&self) -> &[HostCheckItem] {
        &self.items
    }
}

impl ResponsePayload for HostCheckData {
    fn namespace(&self) -> &str {
        NS
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.items.is_empty() {
            return Err(EppError::missing_attribute("host:cd"));
        }
        let mut data = crate::mapping_element("chkData");
        for item in &self.items {
            let mut cd = Element::new(NS, "cd").with_child(
                Element::new(NS, "name")
                    .with_attribute("avail", if item.available { "1" } else { "0" })
                    .with_text(item.name.clone()),
            );
            if let Some(reason) = &item.reason {
                cd.push_child(Element::new(NS, "reason").with_text(reason.clone()));
            }
            data.push_child(cd);
        }
        Ok(data)
    }

    fn decode_payload(&mut self, element: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        self.items = element
            .children_named(NS, "cd")
            .map(|cd| {
                let name = cd.require_child(NS, "name")?;
                let available = match name.require_attribute("avail")? {
                    "1" | "true" => true,
                    "0" | "false" => false,
                    other => {
                        return Err(EppError::malformed(format!(
                            "`{other}` is not an availability flag"
                        )));
                    }
                };
                Ok(HostCheckItem {
                    name: name.require_text()?.into(),
                    available,
                    reason: cd.child_text_owned(NS, "reason"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if self.items.is_empty() {
            return Err(EppError::malformed("chkData carries no result"));
        }
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn ResponsePayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// create 响应数据（`creData`）。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostCreateData {
    name: String,
    create_date: DateTime<Utc>,
}

impl Default for HostCreateData {
    fn default() -> Self {
        Self {
            name: String::new(),
            create_date: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl HostCreateData {
    /// 以主机名与创建时间构造。
    pub fn new(name: impl Into<String>, create_date: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            create_date,
        }
    }

    /// 创建的主机名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 创建时间。
    pub fn create_date(&self) -> DateTime<Utc> {
        self.create_date
    }
}

impl ResponsePayload for HostCreateData {
    fn namespace(&self) -> &str {
        NS
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("host:name"));
        }
        Ok(crate::mapping_element("creData")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()))
            .with_child(Element::new(NS, "crDate").with_text(format_date_time(self.create_date))))
    }

    fn decode_payload(&mut self, element: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        self.name = element.require_child_text(NS, "name")?.into();
        self.create_date = parse_date_time(element.require_child_text(NS, "crDate")?)?;
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn ResponsePayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// info 响应数据（`infData`）。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostInfoData {
    name: String,
    roid: String,
    statuses: Vec<HostStatusKind>,
    addresses: Vec<HostAddress>,
    sponsoring_client: String,
    creator: Option<String>,
    create_date: Option<DateTime<Utc>>,
    updater: Option<String>,
    update_date: Option<DateTime<Utc>>,
    transfer_date: Option<DateTime<Utc>>,
}

impl HostInfoData {
    /// 以主机名、仓库标识与当前受理注册商构造。
    pub fn new(
        name: impl Into<String>,
        roid: impl Into<String>,
        sponsoring_client: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            roid: roid.into(),
            sponsoring_client: sponsoring_client.into(),
            ..Self::default()
        }
    }

    /// Builder：追加一个状态值。
    pub fn with_status(mut self, status: HostStatusKind) -> Self {
        self.statuses.push(status);
        self
    }

    /// Builder：追加一个粘连地址。
    pub fn with_address(mut self, address: HostAddress) -> Self {
        self.addresses.push(address);
        self
    }

    /// Builder：设置创建方与创建时间。
    pub fn with_created(mut self, creator: impl Into<String>, date: DateTime<Utc>) -> Self {
        self.creator = Some(creator.into());
        self.create_date = Some(date);
        self
    }

    /// Builder：设置最近更新方与时间。
    pub fn with_updated(mut self, updater: impl Into<String>, date: DateTime<Utc>) -> Self {
        self.updater = Some(updater.into());
        self.update_date = Some(date);
        self
    }

    /// Builder：设置最近转移时间。
    pub fn with_transfer_date(mut self, date: DateTime<Utc>) -> Self {
        self.transfer_date = Some(date);
        self
    }

    /// 主机名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 仓库对象标识。
    pub fn roid(&self) -> &str {
        &self.roid
    }

    /// 状态值序列。
    pub fn statuses(&self) -> &[HostStatusKind] {
        &self.statuses
    }

    /// 粘连地址序列。
    pub fn addresses(&self) -> &[HostAddress] {
        &self.addresses
    }

    /// 当前受理注册商。
    pub fn sponsoring_client(&self) -> &str {
        &self.sponsoring_client
    }
}

impl ResponsePayload for HostInfoData {
    fn namespace(&self) -> &str {
        NS
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("host:name"));
        }
        if self.roid.is_empty() {
            return Err(EppError::missing_attribute("host:roid"));
        }
        if self.sponsoring_client.is_empty() {
            return Err(EppError::missing_attribute("host:clID"));
        }
        let mut data = crate::mapping_element("infData")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()))
            .with_child(Element::new(NS, "roid").with_text(self.roid.clone()));
        for status in &self.statuses {
            data.push_child(status.to_element());
        }
        for address in &self.addresses {
            data.push_child(address.to_element()?);
        }
        data.push_child(Element::new(NS, "clID").with_text(self.sponsoring_client.clone()));
        if let Some(creator) = &self.creator {
            data.push_child(Element::new(NS, "crID").with_text(creator.clone()));
        }
        if let Some(date) = self.create_date {
            data.push_child(Element::new(NS, "crDate").with_text(format_date_time(date)));
        }
        if let Some(updater) = &self.updater {
            data.push_child(Element::new(NS, "upID").with_text(updater.clone()));
        }
        if let Some(date) = self.update_date {
            data.push_child(Element::new(NS, "upDate").with_text(format_date_time(date)));
        }
        if let Some(date) = self.transfer_date {
            data.push_child(Element::new(NS, "trDate").with_text(format_date_time(date)));
        }
        Ok(data)
    }

    fn decode_payload(&mut self, element: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        self.name = element.require_child_text(NS, "name")?.into();
        self.roid = element.require_child_text(NS, "roid")?.into();
        self.statuses = element
            .children_named(NS, "status")
            .map(HostStatusKind::from_element)
            .collect::<Result<Vec<_>>>()?;
        self.addresses = element
            .children_named(NS, "addr")
            .map(HostAddress::from_element)
            .collect::<Result<Vec<_>>>()?;
        self.sponsoring_client = element.require_child_text(NS, "clID")?.into();
        self.creator = element.child_text_owned(NS, "crID");
        self.create_date = match element.child_text(NS, "crDate") {
            Some(text) => Some(parse_date_time(text)?),
            None => None,
        };
        self.updater = element.child_text_owned(NS, "upID");
        self.update_date = match element.child_text(NS, "upDate") {
            Some(text) => Some(parse_date_time(text)?),
            None => None,
        };
        self.transfer_date = match element.child_text(NS, "trDate") {
            Some(text) => Some(parse_date_time(text)?),
            None => None,
        };
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn ResponsePayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 工厂路径：按数据块本地名实例化空壳响应。
pub(crate) fn shell_for(element: &Element) -> Option<Response> {
    let payload: Box<dyn ResponsePayload> = match element.local_name() {
        "chkData" => Box::new(HostCheckData::default()),
        "creData" => Box::new(HostCreateData::default()),
        "infData" => Box::new(HostInfoData::default()),
        _ => return None,
    };
    Some(Response::for_payload(payload))
}
