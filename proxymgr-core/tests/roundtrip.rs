//! Save → load roundtrip law for svcmap records.
//!
//! Each `#[case]` runs in its own temp dir.

use proxymgr_core::{store, Serializer, ServiceMapping, ServiceName};
use rstest::rstest;

fn mapping(name: &str, address: &str, generate_client: bool, serializer: Serializer) -> ServiceMapping {
    ServiceMapping {
        name: ServiceName::from(name),
        address: address.to_string(),
        generate_client,
        serializer,
    }
}

#[rstest]
#[case::auto(mapping("Input", "https://svc/Input.svc", false, Serializer::Auto))]
#[case::xml_client(mapping("Billing", "http://host:8080/Billing.svc?wsdl", true, Serializer::XmlSerializer))]
#[case::data_contract(mapping("Orders", "/srv/contracts/orders.wsdl", true, Serializer::DataContract))]
#[case::escaped_query(mapping("Query", "https://svc/Q.svc?a=1&b=<2>", false, Serializer::Auto))]
#[case::unicode(mapping("Сервис", "https://svc/サービス.svc", false, Serializer::DataContract))]
#[case::windows_path(mapping("Local", r"C:\contracts\local.wsdl", false, Serializer::XmlSerializer))]
#[case::padded_input(ServiceMapping::new("Input", " https://svc/Input.svc "))]
fn save_then_load_is_identity(#[case] original: ServiceMapping) {
    original.validate().expect("valid mapping");

    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir
        .path()
        .join(original.name.as_str())
        .join(format!("{}.svcmap", original.name));

    store::save(&path, &original).expect("save");
    let loaded = store::load(&path).expect("load");
    assert_eq!(loaded, original);
}

#[test]
fn load_then_save_preserves_content() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("Input.svcmap");
    store::save(&path, &mapping("Input", "https://svc/Input.svc", true, Serializer::Auto))
        .expect("save");
    let first = std::fs::read_to_string(&path).expect("read");

    let loaded = store::load(&path).expect("load");
    store::save(&path, &loaded).expect("resave");
    let second = std::fs::read_to_string(&path).expect("read");

    assert_eq!(first, second);
}
