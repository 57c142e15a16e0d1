//! End-to-end tests of the harvester against a mock OAI-PMH endpoint.
//!
//! The mock server runs on a tokio runtime owned by the test while the
//! blocking HTTP client is driven from the test thread.

use oai_harvester::output::{generate_csv, generate_xml, read_csv, read_xml_records};
use oai_harvester::{
    HarvestOutcome, HarvestRequest, Harvester, HarvesterError, Record, TransportSettings, Verb,
};
use pretty_assertions::assert_eq;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OAI_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/"
         xmlns:pico="http://purl.org/pico/1.0/"
         xmlns:dc="http://purl.org/dc/elements/1.1/"
         xmlns:dcterms="http://purl.org/dc/terms/">
  <responseDate>2024-05-01T10:00:00Z</responseDate>"#;

/// Mock endpoint plus the runtime that drives its async API.
struct MockOai {
    server: MockServer,
    rt: Runtime,
}

impl MockOai {
    fn start() -> Self {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    fn endpoint(&self) -> String {
        format!("{}/oai", self.server.uri())
    }

    fn received_queries(&self) -> Vec<Vec<(String, String)>> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .iter()
            .map(|r| r.url.query_pairs().into_owned().collect())
            .collect()
    }
}

fn list_records_page(records: &[(&str, &str)], token: Option<&str>) -> String {
    let body: String = records
        .iter()
        .map(|(id, title)| {
            format!(
                r#"
    <record>
      <header><identifier>{id}</identifier></header>
      <metadata>
        <pico:record>
          <dc:identifier>{id}</dc:identifier>
          <dc:title>{title}</dc:title>
          <dc:type>Oggetto fisico</dc:type>
          <dc:subject>Art</dc:subject>
          <dc:subject>History</dc:subject>
        </pico:record>
      </metadata>
    </record>"#
            )
        })
        .collect();
    let token = token
        .map(|t| format!("<resumptionToken cursor=\"0\">{t}</resumptionToken>"))
        .unwrap_or_default();
    format!("{OAI_HEAD}\n  <ListRecords>{body}\n    {token}\n  </ListRecords>\n</OAI-PMH>")
}

fn xml_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/xml; charset=utf-8")
}

fn harvester() -> Harvester<oai_harvester::HttpTransport> {
    Harvester::http(TransportSettings::default()).unwrap()
}

#[test]
fn test_two_page_harvest_over_http() {
    let mock = MockOai::start();
    mock.mount(
        Mock::given(method("GET"))
            .and(path("/oai"))
            .and(query_param("verb", "ListRecords"))
            .and(query_param("set", "museid"))
            .and(query_param("metadataPrefix", "pico"))
            .respond_with(xml_response(list_records_page(
                &[("oai:mus:1", "Anfora"), ("oai:mus:2", "Kylix")],
                Some("T1"),
            ))),
    );
    mock.mount(
        Mock::given(method("GET"))
            .and(path("/oai"))
            .and(query_param("resumptionToken", "T1"))
            .and(query_param_is_missing("set"))
            .and(query_param_is_missing("metadataPrefix"))
            .respond_with(xml_response(list_records_page(
                &[("oai:mus:3", "Cratere")],
                None,
            ))),
    );

    let request = HarvestRequest::new(mock.endpoint(), Verb::ListRecords).with_set("museid");
    let records = harvester().list_records(&request).unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec!["oai:mus:1", "oai:mus:2", "oai:mus:3"]);
    assert_eq!(records[2].title, "Cratere");
    assert_eq!(records[0].subjects, vec!["Art", "History"]);

    let queries = mock.received_queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(
        queries[1],
        vec![
            ("resumptionToken".to_string(), "T1".to_string()),
            ("verb".to_string(), "ListRecords".to_string()),
        ]
    );
}

#[test]
fn test_record_limit_over_http() {
    let mock = MockOai::start();
    mock.mount(
        Mock::given(method("GET"))
            .and(query_param_is_missing("resumptionToken"))
            .respond_with(xml_response(list_records_page(
                &[("1", "a"), ("2", "b"), ("3", "c")],
                Some("T1"),
            ))),
    );

    let request = HarvestRequest::new(mock.endpoint(), Verb::ListRecords)
        .with_set("museid")
        .with_record_limit(2);
    let records = harvester().list_records(&request).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(mock.received_queries().len(), 1);
}

#[test]
fn test_http_500_fails_with_context() {
    let mock = MockOai::start();
    mock.mount(
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(500).set_body_string("boom")),
    );

    let request = HarvestRequest::new(mock.endpoint(), Verb::ListRecords).with_set("museid");
    let err = harvester().list_records(&request).unwrap_err();

    match &err {
        HarvesterError::HttpStatus {
            endpoint,
            verb,
            code,
            body,
        } => {
            assert_eq!(endpoint, &mock.endpoint());
            assert_eq!(*verb, Verb::ListRecords);
            assert_eq!(*code, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[test]
fn test_malformed_response_fails() {
    let mock = MockOai::start();
    mock.mount(
        Mock::given(method("GET"))
            .respond_with(xml_response("<OAI-PMH><ListRecords>".to_string())),
    );

    let request = HarvestRequest::new(mock.endpoint(), Verb::ListRecords).with_set("museid");
    let err = harvester().list_records(&request).unwrap_err();
    assert!(matches!(err, HarvesterError::XmlParse { .. }));
}

#[test]
fn test_response_size_limit() {
    let mock = MockOai::start();
    mock.mount(
        Mock::given(method("GET"))
            .respond_with(xml_response(list_records_page(&[("1", "a")], None))),
    );

    let settings = TransportSettings {
        max_response_bytes: 64,
        ..TransportSettings::default()
    };
    let request = HarvestRequest::new(mock.endpoint(), Verb::ListRecords).with_set("museid");
    let err = Harvester::http(settings)
        .unwrap()
        .list_records(&request)
        .unwrap_err();

    assert!(matches!(
        err,
        HarvesterError::ResponseTooLarge { limit: 64, .. }
    ));
}

#[test]
fn test_latin1_endpoint_is_decoded() {
    let mock = MockOai::start();
    let mut body = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
<OAI-PMH xmlns=\"http://www.openarchives.org/OAI/2.0/\" \
xmlns:pico=\"http://purl.org/pico/1.0/\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\
<ListRecords><pico:record><dc:identifier>r1</dc:identifier><dc:title>"
        .to_vec();
    body.extend_from_slice(b"Citt\xe0 di Forl\xec");
    body.extend_from_slice(b"</dc:title></pico:record></ListRecords></OAI-PMH>");
    mock.mount(
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/xml")),
    );

    let request = HarvestRequest::new(mock.endpoint(), Verb::ListRecords).with_set("museid");
    let records = harvester().list_records(&request).unwrap();

    assert_eq!(records[0].title, "Città di Forlì");
}

#[test]
fn test_undecodable_body_fails() {
    let mock = MockOai::start();
    let body = b"<OAI-PMH><ListRecords>Forl\xec</ListRecords></OAI-PMH>".to_vec();
    mock.mount(
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/xml")),
    );

    let request = HarvestRequest::new(mock.endpoint(), Verb::ListRecords).with_set("museid");
    let err = harvester().list_records(&request).unwrap_err();

    assert!(matches!(
        err,
        HarvesterError::Decode {
            verb: Verb::ListRecords,
            ..
        }
    ));
}

#[test]
fn test_connection_refused_is_network_error() {
    // Nothing listens on the discard port
    let request =
        HarvestRequest::new("http://127.0.0.1:9/oai", Verb::ListRecords).with_set("museid");
    let err = harvester().list_records(&request).unwrap_err();

    assert!(matches!(
        err,
        HarvesterError::Network {
            verb: Verb::ListRecords,
            ..
        }
    ));
}

#[test]
fn test_list_sets_returns_stripped_document() {
    let mock = MockOai::start();
    let body = format!(
        "{OAI_HEAD}\n  <ListSets>\n    <set><setSpec>museid</setSpec><setName>Musei</setName></set>\n  </ListSets>\n</OAI-PMH>"
    );
    mock.mount(
        Mock::given(method("GET"))
            .and(query_param("verb", "ListSets"))
            .respond_with(xml_response(body)),
    );

    let request = HarvestRequest::new(mock.endpoint(), Verb::ListSets);
    let outcome = harvester().harvest(&request).unwrap();

    let HarvestOutcome::Document(document) = outcome else {
        panic!("expected a document");
    };
    assert!(document.starts_with("<OAI-PMH>"));
    assert!(document.contains("<setSpec>museid</setSpec>"));
    assert!(!document.contains("xmlns"));
    assert_eq!(
        mock.received_queries(),
        vec![vec![("verb".to_string(), "ListSets".to_string())]]
    );
}

#[test]
fn test_harvested_records_survive_csv_and_xml() {
    let mock = MockOai::start();
    mock.mount(
        Mock::given(method("GET")).respond_with(xml_response(list_records_page(
            &[("oai:mus:1", "Vaso &amp; coperchio")],
            None,
        ))),
    );

    let request = HarvestRequest::new(mock.endpoint(), Verb::ListRecords).with_set("museid");
    let records = harvester().list_records(&request).unwrap();
    assert_eq!(records[0].title, "Vaso & coperchio");

    let csv = generate_csv(&records).unwrap();
    let from_csv: Vec<Record> = read_csv(csv.as_bytes()).unwrap();
    let xml = generate_xml(&from_csv, None).unwrap();

    assert!(xml.contains("<subject>Art</subject>"));
    assert!(xml.contains("<subject>History</subject>"));
    assert_eq!(read_xml_records(&xml).unwrap(), records);
}
