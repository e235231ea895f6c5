//! SOAP 1.1 facade over the incident service, served at `/Service.asmx`.
//!
//! Requests are parsed with `quick-xml`: the first element inside
//! `Envelope/Body` names the operation and its child elements carry the
//! arguments. Responses use the `{Operation}Response/{Operation}Result`
//! wrapping SOAP toolkits expect.

use std::{collections::HashMap, fmt::Write as _};

use quick_xml::{escape::escape, events::Event, Reader};
use tracing::{error, info};

use crate::{
    db::models::Incident,
    error::ServiceError,
    incidents::IncidentService,
    reports::csv_timestamp,
};

pub const SERVICE_NAMESPACE: &str = "http://tempuri.org/";
const ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    /// The request was malformed or referenced missing data.
    Client,
    Server,
}

impl FaultCode {
    fn as_str(self) -> &'static str {
        match self {
            FaultCode::Client => "Client",
            FaultCode::Server => "Server",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    pub code: FaultCode,
    pub message: String,
}

impl SoapFault {
    fn client(message: impl Into<String>) -> Self {
        Self {
            code: FaultCode::Client,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for SoapFault {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message)
            | ServiceError::InvalidInput(message)
            | ServiceError::InvalidOperation(message) => Self::client(message),
            other => {
                error!(error = %other, "SOAP operation failed");
                Self {
                    code: FaultCode::Server,
                    message: "Internal server error".to_owned(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SoapRequest {
    ReportIncident {
        incident_type: String,
        description: String,
        building_id: i64,
        severity: String,
    },
    GetUnresolvedIncidents,
    GetAllIncidents,
    GetIncidentById { id: i64 },
    DeleteIncident { id: i64 },
}

impl SoapRequest {
    pub fn operation(&self) -> &'static str {
        match self {
            SoapRequest::ReportIncident { .. } => "ReportIncident",
            SoapRequest::GetUnresolvedIncidents => "GetUnresolvedIncidents",
            SoapRequest::GetAllIncidents => "GetAllIncidents",
            SoapRequest::GetIncidentById { .. } => "GetIncidentById",
            SoapRequest::DeleteIncident { .. } => "DeleteIncident",
        }
    }
}

/// Pulls the operation name and its (flat) arguments out of an envelope.
fn read_operation(xml: &str) -> Result<(String, HashMap<String, String>), SoapFault> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut operation: Option<String> = None;
    let mut args: HashMap<String, String> = HashMap::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SoapFault::client(format!("Malformed XML: {e}")))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match path.len() {
                    0 if name != "Envelope" => {
                        return Err(SoapFault::client("Expected a SOAP Envelope."));
                    }
                    2 if path[1] == "Body" && operation.is_none() => {
                        operation = Some(name.clone());
                    }
                    3 if operation.is_some() => {
                        args.entry(name.clone()).or_default();
                    }
                    _ => {}
                }
                if matches!(event, Event::Start(_)) {
                    path.push(name);
                }
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(t) if path.len() == 4 => {
                let text = t
                    .unescape()
                    .map_err(|e| SoapFault::client(format!("Malformed XML: {e}")))?;
                args.entry(path[3].clone()).or_default().push_str(&text);
            }
            Event::CData(c) if path.len() == 4 => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                args.entry(path[3].clone()).or_default().push_str(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    operation
        .map(|op| (op, args))
        .ok_or_else(|| SoapFault::client("SOAP Body contains no operation."))
}

fn required<'a>(args: &'a HashMap<String, String>, name: &str) -> Result<&'a str, SoapFault> {
    args.get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SoapFault::client(format!("Missing argument '{name}'.")))
}

fn required_id(args: &HashMap<String, String>, name: &str) -> Result<i64, SoapFault> {
    required(args, name)?
        .parse()
        .map_err(|_| SoapFault::client(format!("Argument '{name}' must be an integer.")))
}

pub fn parse_request(xml: &str) -> Result<SoapRequest, SoapFault> {
    let (operation, args) = read_operation(xml)?;
    let request = match operation.as_str() {
        "ReportIncident" => SoapRequest::ReportIncident {
            incident_type: required(&args, "type")?.to_owned(),
            description: args.get("description").cloned().unwrap_or_default(),
            building_id: required_id(&args, "buildingId")?,
            severity: args
                .get("severity")
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .unwrap_or("Low")
                .to_owned(),
        },
        "GetUnresolvedIncidents" => SoapRequest::GetUnresolvedIncidents,
        "GetAllIncidents" => SoapRequest::GetAllIncidents,
        "GetIncidentById" => SoapRequest::GetIncidentById {
            id: required_id(&args, "id")?,
        },
        "DeleteIncident" => SoapRequest::DeleteIncident {
            id: required_id(&args, "id")?,
        },
        other => return Err(SoapFault::client(format!("Unknown operation '{other}'."))),
    };
    Ok(request)
}

fn incident_xml(out: &mut String, incident: &Incident) {
    let ended_at = incident
        .ended_at
        .as_ref()
        .map(csv_timestamp)
        .unwrap_or_default();
    let _ = write!(
        out,
        "<Incident><Id>{}</Id><Type>{}</Type><StartedAt>{}</StartedAt><EndedAt>{}</EndedAt>\
         <Severity>{}</Severity><Status>{}</Status><Description>{}</Description>\
         <BuildingId>{}</BuildingId></Incident>",
        incident.id,
        escape(incident.incident_type.as_str()),
        csv_timestamp(&incident.started_at),
        ended_at,
        escape(incident.severity.as_str()),
        escape(incident.status.as_str()),
        escape(incident.description.as_str()),
        incident.building_id,
    );
}

fn envelope(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <s:Envelope xmlns:s=\"{ENVELOPE_NAMESPACE}\"><s:Body>{body}</s:Body></s:Envelope>"
    )
}

fn response_envelope(operation: &str, result: &str) -> String {
    envelope(&format!(
        "<{operation}Response xmlns=\"{SERVICE_NAMESPACE}\">\
         <{operation}Result>{result}</{operation}Result></{operation}Response>"
    ))
}

pub fn fault_envelope(fault: &SoapFault) -> String {
    envelope(&format!(
        "<s:Fault><faultcode>s:{}</faultcode><faultstring>{}</faultstring></s:Fault>",
        fault.code.as_str(),
        escape(fault.message.as_str()),
    ))
}

/// Executes SOAP calls against the incident store.
#[derive(Clone)]
pub struct SoapService {
    incidents: IncidentService,
}

impl SoapService {
    pub fn new(incidents: IncidentService) -> Self {
        Self { incidents }
    }

    /// Parses, executes and renders one call. `Err` carries a fault envelope.
    pub async fn handle(&self, xml: &str) -> Result<String, String> {
        let outcome = match parse_request(xml) {
            Ok(request) => self.execute(request).await,
            Err(fault) => Err(fault),
        };
        outcome.map_err(|fault| fault_envelope(&fault))
    }

    async fn execute(&self, request: SoapRequest) -> Result<String, SoapFault> {
        let operation = request.operation();
        let result = match request {
            SoapRequest::ReportIncident {
                incident_type,
                description,
                building_id,
                severity,
            } => {
                let incident = self
                    .incidents
                    .report(&incident_type, &description, building_id, &severity)
                    .await?;
                info!(incident_id = incident.id, "Incident reported over SOAP");
                format!("Incident received. ID: {}", incident.id)
            }
            SoapRequest::GetUnresolvedIncidents => {
                let mut out = String::new();
                for incident in self.incidents.list_unresolved().await? {
                    incident_xml(&mut out, &incident);
                }
                out
            }
            SoapRequest::GetAllIncidents => {
                let mut out = String::new();
                for incident in self.incidents.list().await? {
                    incident_xml(&mut out, &incident);
                }
                out
            }
            SoapRequest::GetIncidentById { id } => {
                let mut out = String::new();
                if let Some(incident) = self.incidents.get(id).await? {
                    incident_xml(&mut out, &incident);
                }
                out
            }
            SoapRequest::DeleteIncident { id } => self.incidents.delete(id).await?.to_string(),
        };
        Ok(response_envelope(operation, &result))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::SqlitePool;

    use super::*;
    use crate::test_support::{count, insert_building, insert_incident};

    fn call(operation: &str, args: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:tem="http://tempuri.org/">
  <soap:Body>
    <tem:{operation}>{args}</tem:{operation}>
  </soap:Body>
</soap:Envelope>"#
        )
    }

    #[test]
    fn parses_report_incident_arguments() {
        let xml = call(
            "ReportIncident",
            "<tem:type>Fire</tem:type><tem:description>Smoke &amp; heat</tem:description>\
             <tem:buildingId>4</tem:buildingId><tem:severity>High</tem:severity>",
        );
        assert_eq!(
            parse_request(&xml).unwrap(),
            SoapRequest::ReportIncident {
                incident_type: "Fire".into(),
                description: "Smoke & heat".into(),
                building_id: 4,
                severity: "High".into(),
            }
        );
    }

    #[test]
    fn parses_operations_without_arguments() {
        let xml = call("GetUnresolvedIncidents", "");
        assert_eq!(parse_request(&xml).unwrap(), SoapRequest::GetUnresolvedIncidents);

        let self_closing = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><GetAllIncidents xmlns="http://tempuri.org/"/></s:Body></s:Envelope>"#;
        assert_eq!(parse_request(self_closing).unwrap(), SoapRequest::GetAllIncidents);
    }

    #[test]
    fn bad_requests_are_client_faults() {
        let not_soap = parse_request("<html/>").unwrap_err();
        assert_eq!(not_soap.code, FaultCode::Client);

        let bad_id = parse_request(&call("GetIncidentById", "<tem:id>abc</tem:id>")).unwrap_err();
        assert!(bad_id.message.contains("integer"));

        let unknown = parse_request(&call("Explode", "")).unwrap_err();
        assert!(unknown.message.contains("Explode"));

        let missing = parse_request(&call("ReportIncident", "<tem:buildingId>1</tem:buildingId>"))
            .unwrap_err();
        assert!(missing.message.contains("'type'"));
    }

    #[test]
    fn fault_message_is_escaped() {
        let xml = fault_envelope(&SoapFault::client("a < b"));
        assert!(xml.contains("<faultcode>s:Client</faultcode>"));
        assert!(xml.contains("<faultstring>a &lt; b</faultstring>"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn report_then_query(pool: SqlitePool) {
        let building = insert_building(&pool, "HQ").await;
        insert_incident(&pool, building, "Gas", "Resolved", "", Utc::now()).await;
        let soap = SoapService::new(IncidentService::new(pool.clone()));

        let reported = soap
            .handle(&call(
                "ReportIncident",
                &format!("<tem:type>Fire</tem:type><tem:buildingId>{building}</tem:buildingId>"),
            ))
            .await
            .unwrap();
        assert!(reported.contains("<ReportIncidentResult>Incident received. ID: "));
        assert_eq!(count(&pool, "incidents").await, 2);

        let unresolved = soap.handle(&call("GetUnresolvedIncidents", "")).await.unwrap();
        assert_eq!(unresolved.matches("<Incident>").count(), 1);
        assert!(unresolved.contains("<Type>Fire</Type>"));
        assert!(unresolved.contains("<Status>Reported</Status>"));

        let all = soap.handle(&call("GetAllIncidents", "")).await.unwrap();
        assert_eq!(all.matches("<Incident>").count(), 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn get_and_delete_by_id(pool: SqlitePool) {
        let building = insert_building(&pool, "HQ").await;
        let id = insert_incident(&pool, building, "Flood", "Open", "a <b>", Utc::now()).await;
        let soap = SoapService::new(IncidentService::new(pool));

        let found = soap
            .handle(&call("GetIncidentById", &format!("<tem:id>{id}</tem:id>")))
            .await
            .unwrap();
        assert!(found.contains("<Description>a &lt;b&gt;</Description>"));

        let deleted = soap
            .handle(&call("DeleteIncident", &format!("<tem:id>{id}</tem:id>")))
            .await
            .unwrap();
        assert!(deleted.contains("<DeleteIncidentResult>true</DeleteIncidentResult>"));

        let missing = soap
            .handle(&call("GetIncidentById", &format!("<tem:id>{id}</tem:id>")))
            .await
            .unwrap();
        assert!(missing.contains("<GetIncidentByIdResult></GetIncidentByIdResult>"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_building_is_client_fault(pool: SqlitePool) {
        let soap = SoapService::new(IncidentService::new(pool));
        let fault = soap
            .handle(&call(
                "ReportIncident",
                "<tem:type>Fire</tem:type><tem:buildingId>77</tem:buildingId>",
            ))
            .await
            .unwrap_err();
        assert!(fault.contains("s:Client"));
        assert!(fault.contains("Building 77 does not exist."));
    }
}
