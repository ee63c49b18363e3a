//! 域名映射的响应数据块（`<resData>` 之内）。
//!
//! # 契约说明（What）
//! - 每个数据块对应一种命令的成功响应：`chkData`、`creData`、`infData`、
//!   `renData`、`trnData`；
//! - 转移数据块（`trnData`）承载流程状态与请求/受理双方的标识与时间戳，
//!   工作流转换本身属于服务端职责，不在编解码层。

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use chrono::{DateTime, Utc};

use epp_core::{
    DecodeContext, Element, EncodeContext, EppError, Response, ResponsePayload, Result,
    TransferStatus,
};

use crate::NS;
use crate::types::{AuthInfo, DomainContact, DomainStatus, format_date_time, parse_date_time};

/// check 响应中的单个查询结论。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainCheckItem {
    name: String,
    available: bool,
    reason: Option<String>,
}

impl DomainCheckItem {
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

    /// 是否可注册。
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
pub struct DomainCheckData {
    items: Vec<DomainCheckItem>,
}

impl DomainCheckData {
    /// 以结论列表构造。
    pub fn new(items: impl IntoIterator<Item = DomainCheckItem>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// 查询结论序列（保持请求顺序）。
    pub fn items(&self) -> &[DomainCheckItem] {
        &self.items
    }
}

impl ResponsePayload for DomainCheckData {
    fn namespace(&self) -> &str {
        NS
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.items.is_empty() {
            return Err(EppError::missing_attribute("domain:cd"));
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
                Ok(DomainCheckItem {
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
pub struct DomainCreateData {
    name: String,
    create_date: DateTime<Utc>,
    expiry_date: Option<DateTime<Utc>>,
}

impl Default for DomainCreateData {
    fn default() -> Self {
        Self {
            name: String::new(),
            create_date: DateTime::<Utc>::UNIX_EPOCH,
            expiry_date: None,
        }
    }
}

impl DomainCreateData {
    /// 以域名与创建时间构造。
    pub fn new(name: impl Into<String>, create_date: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            create_date,
            expiry_date: None,
        }
    }

    /// Builder：设置到期时间。
    pub fn with_expiry_date(mut self, expiry_date: DateTime<Utc>) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    /// 创建的域名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 创建时间。
    pub fn create_date(&self) -> DateTime<Utc> {
        self.create_date
    }

    /// 到期时间。
    pub fn expiry_date(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
    }
}

impl ResponsePayload for DomainCreateData {
    fn namespace(&self) -> &str {
        NS
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("domain:name"));
        }
        let mut data = crate::mapping_element("creData")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()))
            .with_child(Element::new(NS, "crDate").with_text(format_date_time(self.create_date)));
        if let Some(expiry) = self.expiry_date {
            data.push_child(Element::new(NS, "exDate").with_text(format_date_time(expiry)));
        }
        Ok(data)
    }

    fn decode_payload(&mut self, element: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        self.name = element.require_child_text(NS, "name")?.into();
        self.create_date = parse_date_time(element.require_child_text(NS, "crDate")?)?;
        self.expiry_date = match element.child_text(NS, "exDate") {
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

/// info 响应数据（`infData`）。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainInfoData {
    name: String,
    roid: String,
    statuses: Vec<DomainStatus>,
    registrant: Option<String>,
    contacts: Vec<DomainContact>,
    nameservers: Vec<String>,
    subordinate_hosts: Vec<String>,
    sponsoring_client: String,
    creator: Option<String>,
    create_date: Option<DateTime<Utc>>,
    updater: Option<String>,
    update_date: Option<DateTime<Utc>>,
    expiry_date: Option<DateTime<Utc>>,
    transfer_date: Option<DateTime<Utc>>,
    auth_info: Option<AuthInfo>,
}

impl DomainInfoData {
    /// 以域名、仓库标识与当前受理注册商构造。
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
    pub fn with_status(mut self, status: DomainStatus) -> Self {
        self.statuses.push(status);
        self
    }

    /// Builder：设置注册人。
    pub fn with_registrant(mut self, registrant: impl Into<String>) -> Self {
        self.registrant = Some(registrant.into());
        self
    }

    /// Builder：追加一个联系人关联。
    pub fn with_contact(mut self, contact: DomainContact) -> Self {
        self.contacts.push(contact);
        self
    }

    /// Builder：追加一个委派主机。
    pub fn with_nameserver(mut self, host: impl Into<String>) -> Self {
        self.nameservers.push(host.into());
        self
    }

    /// Builder：追加一个下属主机。
    pub fn with_subordinate_host(mut self, host: impl Into<String>) -> Self {
        self.subordinate_hosts.push(host.into());
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

    /// Builder：设置到期时间。
    pub fn with_expiry_date(mut self, date: DateTime<Utc>) -> Self {
        self.expiry_date = Some(date);
        self
    }

    /// Builder：设置最近转移时间。
    pub fn with_transfer_date(mut self, date: DateTime<Utc>) -> Self {
        self.transfer_date = Some(date);
        self
    }

    /// Builder：附带授权信息（仅对被授权方返回）。
    pub fn with_auth_info(mut self, auth_info: AuthInfo) -> Self {
        self.auth_info = Some(auth_info);
        self
    }

    /// 域名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 仓库对象标识。
    pub fn roid(&self) -> &str {
        &self.roid
    }

    /// 状态值序列。
    pub fn statuses(&self) -> &[DomainStatus] {
        &self.statuses
    }

    /// 注册人。
    pub fn registrant(&self) -> Option<&str> {
        self.registrant.as_deref()
    }

    /// 联系人关联序列。
    pub fn contacts(&self) -> &[DomainContact] {
        &self.contacts
    }

    /// 委派主机序列。
    pub fn nameservers(&self) -> &[String] {
        &self.nameservers
    }

    /// 下属主机序列。
    pub fn subordinate_hosts(&self) -> &[String] {
        &self.subordinate_hosts
    }

    /// 当前受理注册商。
    pub fn sponsoring_client(&self) -> &str {
        &self.sponsoring_client
    }

    /// 创建时间。
    pub fn create_date(&self) -> Option<DateTime<Utc>> {
        self.create_date
    }

    /// 到期时间。
    pub fn expiry_date(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
    }

    /// 授权信息。
    pub fn auth_info(&self) -> Option<&AuthInfo> {
        self.auth_info.as_ref()
    }
}

impl ResponsePayload for DomainInfoData {
    fn namespace(&self) -> &str {
        NS
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("domain:name"));
        }
        if self.roid.is_empty() {
            return Err(EppError::missing_attribute("domain:roid"));
        }
        if self.sponsoring_client.is_empty() {
            return Err(EppError::missing_attribute("domain:clID"));
        }
        let mut data = crate::mapping_element("infData")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()))
            .with_child(Element::new(NS, "roid").with_text(self.roid.clone()));
        for status in &self.statuses {
            data.push_child(status.to_element());
        }
        if let Some(registrant) = &self.registrant {
            data.push_child(Element::new(NS, "registrant").with_text(registrant.clone()));
        }
        for contact in &self.contacts {
            data.push_child(contact.to_element());
        }
        if !self.nameservers.is_empty() {
            data.push_child(
                Element::new(NS, "ns").with_children(
                    self.nameservers
                        .iter()
                        .map(|host| Element::new(NS, "hostObj").with_text(host.clone())),
                ),
            );
        }
        for host in &self.subordinate_hosts {
            data.push_child(Element::new(NS, "host").with_text(host.clone()));
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
        if let Some(date) = self.expiry_date {
            data.push_child(Element::new(NS, "exDate").with_text(format_date_time(date)));
        }
        if let Some(date) = self.transfer_date {
            data.push_child(Element::new(NS, "trDate").with_text(format_date_time(date)));
        }
        if let Some(auth_info) = &self.auth_info {
            data.push_child(auth_info.to_element()?);
        }
        Ok(data)
    }

    fn decode_payload(&mut self, element: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        self.name = element.require_child_text(NS, "name")?.into();
        self.roid = element.require_child_text(NS, "roid")?.into();
        self.statuses = element
            .children_named(NS, "status")
            .map(DomainStatus::from_element)
            .collect::<Result<Vec<_>>>()?;
        self.registrant = element.child_text_owned(NS, "registrant");
        self.contacts = element
            .children_named(NS, "contact")
            .map(DomainContact::from_element)
            .collect::<Result<Vec<_>>>()?;
        self.nameservers = match element.child(NS, "ns") {
            Some(hosts) => hosts
                .children_named(NS, "hostObj")
                .map(|host| host.require_text().map(String::from))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        self.subordinate_hosts = element
            .children_named(NS, "host")
            .map(|host| host.require_text().map(String::from))
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
        self.expiry_date = match element.child_text(NS, "exDate") {
            Some(text) => Some(parse_date_time(text)?),
            None => None,
        };
        self.transfer_date = match element.child_text(NS, "trDate") {
            Some(text) => Some(parse_date_time(text)?),
            None => None,
        };
        self.auth_info = match element.child(NS, "authInfo") {
            Some(auth_info) => Some(AuthInfo::from_element(auth_info)?),
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

/// renew 响应数据（`renData`）。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainRenewData {
    name: String,
    expiry_date: Option<DateTime<Utc>>,
}

impl DomainRenewData {
    /// 以域名构造。
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expiry_date: None,
        }
    }

    /// Builder：设置续期后的到期时间。
    pub fn with_expiry_date(mut self, expiry_date: DateTime<Utc>) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    /// 域名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 续期后的到期时间。
    pub fn expiry_date(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
    }
}

impl ResponsePayload for DomainRenewData {
    fn namespace(&self) -> &str {
        NS
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("domain:name"));
        }
        let mut data = crate::mapping_element("renData")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()));
        if let Some(expiry) = self.expiry_date {
            data.push_child(Element::new(NS, "exDate").with_text(format_date_time(expiry)));
        }
        Ok(data)
    }

    fn decode_payload(&mut self, element: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        self.name = element.require_child_text(NS, "name")?.into();
        self.expiry_date = match element.child_text(NS, "exDate") {
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

/// transfer 响应数据（`trnData`）：流程状态加双方标识与时间戳。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainTransferData {
    name: String,
    status: TransferStatus,
    requesting_client: String,
    request_date: DateTime<Utc>,
    acting_client: String,
    action_date: DateTime<Utc>,
    expiry_date: Option<DateTime<Utc>>,
}

impl Default for DomainTransferData {
    fn default() -> Self {
        Self {
            name: String::new(),
            status: TransferStatus::Pending,
            requesting_client: String::new(),
            request_date: DateTime::<Utc>::UNIX_EPOCH,
            acting_client: String::new(),
            action_date: DateTime::<Utc>::UNIX_EPOCH,
            expiry_date: None,
        }
    }
}

impl DomainTransferData {
    /// 以域名、流程状态与双方标识/时间构造。
    pub fn new(
        name: impl Into<String>,
        status: TransferStatus,
        requesting_client: impl Into<String>,
        request_date: DateTime<Utc>,
        acting_client: impl Into<String>,
        action_date: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            requesting_client: requesting_client.into(),
            request_date,
            acting_client: acting_client.into(),
            action_date,
            expiry_date: None,
        }
    }

    /// Builder：设置转移完成后的到期时间。
    pub fn with_expiry_date(mut self, expiry_date: DateTime<Utc>) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    /// 域名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 流程状态。
    pub fn status(&self) -> TransferStatus {
        self.status
    }

    /// 发起方注册商。
    pub fn requesting_client(&self) -> &str {
        &self.requesting_client
    }

    /// 发起时间。
    pub fn request_date(&self) -> DateTime<Utc> {
        self.request_date
    }

    /// 受理方注册商。
    pub fn acting_client(&self) -> &str {
        &self.acting_client
    }

    /// 受理（或截止）时间。
    pub fn action_date(&self) -> DateTime<Utc> {
        self.action_date
    }

    /// 转移完成后的到期时间。
    pub fn expiry_date(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
    }
}

impl ResponsePayload for DomainTransferData {
    fn namespace(&self) -> &str {
        NS
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("domain:name"));
        }
        if self.requesting_client.is_empty() {
            return Err(EppError::missing_attribute("domain:reID"));
        }
        if self.acting_client.is_empty() {
            return Err(EppError::missing_attribute("domain:acID"));
        }
        let mut data = crate::mapping_element("trnData")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()))
            .with_child(Element::new(NS, "trStatus").with_text(self.status.as_str()))
            .with_child(Element::new(NS, "reID").with_text(self.requesting_client.clone()))
            .with_child(Element::new(NS, "reDate").with_text(format_date_time(self.request_date)))
            .with_child(Element::new(NS, "acID").with_text(self.acting_client.clone()))
            .with_child(Element::new(NS, "acDate").with_text(format_date_time(self.action_date)));
        if let Some(expiry) = self.expiry_date {
            data.push_child(Element::new(NS, "exDate").with_text(format_date_time(expiry)));
        }
        Ok(data)
    }

    fn decode_payload(&mut self, element: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        self.name = element.require_child_text(NS, "name")?.into();
        self.status = TransferStatus::parse(element.require_child_text(NS, "trStatus")?)?;
        self.requesting_client = element.require_child_text(NS, "reID")?.into();
        self.request_date = parse_date_time(element.require_child_text(NS, "reDate")?)?;
        self.acting_client = element.require_child_text(NS, "acID")?.into();
        self.action_date = parse_date_time(element.require_child_text(NS, "acDate")?)?;
        self.expiry_date = match element.child_text(NS, "exDate") {
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
        "chkData" => Box::new(DomainCheckData::default()),
        "creData" => Box::new(DomainCreateData::default()),
        "infData" => Box::new(DomainInfoData::default()),
        "renData" => Box::new(DomainRenewData::default()),
        "trnData" => Box::new(DomainTransferData::default()),
        _ => return None,
    };
    Some(Response::for_payload(payload))
}
