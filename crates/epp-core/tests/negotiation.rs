//! Login/问候语协商定律的性质回归。
//!
//! # 教案式说明
//! - **Why**：子集律与归并律是协商算法的全部语义，枚举式用例难以覆盖
//!   集合组合空间，这里用 proptest 对任意服务集合做性质验证。
//! - **How**：从小字母表生成服务集合，分别验证
//!   “归并后子集律必然成立”与“子集律等价于逐项包含”。

use chrono::{DateTime, Utc};
use epp_core::test_stubs::{MarkerExtensionFactory, NoopMappingFactory, STUB_NS};
use epp_core::{ExtensionRegistry, Greeting, LoginCommand, ServiceMenu};
use proptest::prelude::*;

fn service_set() -> impl Strategy<Value = Vec<String>> {
    // 小字母表刻意制造交集与差集共存的组合。
    prop::collection::vec(
        prop::sample::select(vec![
            "urn:example:domain-1.0".to_string(),
            "urn:example:host-1.0".to_string(),
            "urn:example:contact-1.0".to_string(),
            "urn:example:rgp-1.0".to_string(),
            "urn:example:fee-1.0".to_string(),
        ]),
        0..5,
    )
}

fn greeting_advertising(services: &[String]) -> Greeting {
    let mut menu = ServiceMenu::new().with_version("1.0").with_language("en");
    for service in services {
        menu = menu.with_service(service.clone());
    }
    Greeting::new("registry.example", DateTime::<Utc>::UNIX_EPOCH, menu)
}

proptest! {
    #[test]
    fn merge_establishes_the_subset_law(login_set in service_set(), menu_set in service_set()) {
        let greeting = greeting_advertising(&menu_set);
        let mut login = LoginCommand::default().with_services(login_set);
        login.merge_with_greeting(&greeting);
        // 归并律的后置条件：login.services ⊆ greeting.objectServices 恒成立。
        prop_assert!(login.is_valid_against_greeting(&greeting));
        for service in login.services() {
            prop_assert!(menu_set.contains(service));
        }
    }

    #[test]
    fn subset_law_matches_per_item_containment(login_set in service_set(), menu_set in service_set()) {
        let greeting = greeting_advertising(&menu_set);
        let login = LoginCommand::default().with_services(login_set.clone());
        let expected = login_set.iter().all(|service| menu_set.contains(service));
        prop_assert_eq!(login.is_valid_against_greeting(&greeting), expected);
    }
}

#[test]
fn fresh_login_is_seeded_with_every_registered_capability() {
    // Why: Login 默认构造要携带本地能力全集，这是 getServices/getExtensions
    //      与协商算法之间的纽带。
    let mut registry = ExtensionRegistry::new();
    registry.register_mapping(Box::new(NoopMappingFactory::new(STUB_NS)));
    registry.register_mapping(Box::new(NoopMappingFactory::new("urn:example:domain-1.0")));
    registry.register_extension(Box::new(MarkerExtensionFactory::default()));

    let login = LoginCommand::new(&registry, "ClientX", "foo-BAR2");
    assert_eq!(
        login.services(),
        ["urn:example:domain-1.0".to_string(), STUB_NS.to_string()]
    );
    assert_eq!(login.extension_services(), ["urn:example:marker-1.0".to_string()]);
}

#[test]
fn merge_narrows_to_the_mutually_supported_set() {
    let mut registry = ExtensionRegistry::new();
    registry.register_mapping(Box::new(NoopMappingFactory::new("urn:example:domain-1.0")));
    registry.register_mapping(Box::new(NoopMappingFactory::new("urn:example:rgp-1.0")));
    registry.register_extension(Box::new(MarkerExtensionFactory::default()));

    let greeting = greeting_advertising(&["urn:example:domain-1.0".to_string()]);
    let mut login = LoginCommand::new(&registry, "ClientX", "foo-BAR2");
    assert!(!login.is_valid_against_greeting(&greeting));

    login.merge_with_greeting(&greeting);
    assert!(login.is_valid_against_greeting(&greeting));
    assert_eq!(login.services(), ["urn:example:domain-1.0".to_string()]);
    // 问候语未公布任何扩展服务，归并后扩展集合被清空。
    assert!(login.extension_services().is_empty());
}
