//! Network support ticket proposed by the helpdesk model.
//!
//! The model fills the ticket through the `create_ticket` tool. Arguments are
//! checked field by field so the model can be told everything that is wrong
//! in one correction round.

use std::fmt;

use openai_client::ToolSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum RequestType {
    #[serde(rename = "incident")]
    Incident,
    #[serde(rename = "demande")]
    Request,
}

impl RequestType {
    pub const VALUES: &'static [&'static str] = &["incident", "demande"];
}

/// UTC site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Site {
    #[serde(rename = "BF")]
    BenjaminFranklin,
    #[serde(rename = "CR")]
    CentreRecherche,
    #[serde(rename = "PG1")]
    PierreGuillaumat1,
    #[serde(rename = "PG2")]
    PierreGuillaumat2,
    #[serde(rename = "Site innovation")]
    Innovation,
    #[serde(rename = "Cima")]
    Cima,
    #[serde(rename = "UTC-Paris")]
    Paris,
    #[serde(rename = "Escom")]
    Escom,
    #[serde(rename = "Crous/Résidences")]
    Crous,
}

impl Site {
    pub const VALUES: &'static [&'static str] = &[
        "BF",
        "CR",
        "PG1",
        "PG2",
        "Site innovation",
        "Cima",
        "UTC-Paris",
        "Escom",
        "Crous/Résidences",
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum NetworkType {
    #[serde(rename = "Filaire")]
    Wired,
    #[serde(rename = "Wifi")]
    Wifi,
}

impl NetworkType {
    pub const VALUES: &'static [&'static str] = &["Filaire", "Wifi"];
}

/// Information needed to open a network support ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Ticket {
    /// Nom et prénom de la personne concernée. Obligatoire, ne peut pas être inconnu.
    pub personne_concernee: String,
    /// Résumé de la demande en une ligne, par exemple "Pas de Wifi au bureau B134". Obligatoire.
    pub objet: String,
    /// Incident ou demande. Obligatoire.
    pub type_demande: RequestType,
    /// Site de l'UTC concerné. Obligatoire.
    pub site: Site,
    /// Numéro du bureau ou de la salle, par exemple "CR B134". Obligatoire.
    pub numero_bureau_salle: String,
    /// Direction, service ou département, par exemple "DSI/SAGP". Obligatoire.
    pub departement: String,
    /// Numéro de poste ou de téléphone de contact. Obligatoire.
    pub telephone: String,
    /// Le matériel est-il déclaré sur le réseau de l'UTC ? Obligatoire.
    pub materiel_declare: bool,
    /// Filaire ou Wifi, uniquement si le matériel est déclaré.
    #[serde(default)]
    pub type_reseau: Option<NetworkType>,
    /// Description détaillée de la demande. Obligatoire.
    pub description: String,
    /// Noms des fichiers joints, facultatif.
    #[serde(default)]
    pub pieces_jointes: Option<Vec<String>>,
}

/// Declared to the chat model; intercepted, never executed.
pub struct CreateTicket;

impl ToolSpec for CreateTicket {
    const NAME: &'static str = "create_ticket";
    type Args = Ticket;

    fn description(&self) -> &str {
        "Uniquement lorsque l'utilisateur a suivi les indications de l'assistant sans résoudre son problème : \
prépare un ticket d'incident réseau et demande à l'utilisateur de confirmer son envoi."
    }
}

// =============================================================================
// Validation
// =============================================================================

/// One problem with one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub problem: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.field, self.problem)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} champ(s) invalide(s) : {}", .issues.len(), join_issues(.issues))]
pub struct TicketValidationError {
    pub issues: Vec<FieldIssue>,
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ; ")
}

impl TicketValidationError {
    fn single(field: &str, problem: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue {
                field: field.to_string(),
                problem: problem.into(),
            }],
        }
    }

    pub fn fields(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.field.as_str()).collect()
    }
}

const REQUIRED_TEXT: [&str; 6] = [
    "personne_concernee",
    "objet",
    "numero_bureau_salle",
    "departement",
    "telephone",
    "description",
];

#[derive(Default)]
struct Issues(Vec<FieldIssue>);

impl Issues {
    fn push(&mut self, field: &str, problem: impl Into<String>) {
        self.0.push(FieldIssue {
            field: field.to_string(),
            problem: problem.into(),
        });
    }
}

fn present<'a>(args: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    args.get(field).filter(|v| !v.is_null())
}

fn check_choice(args: &Map<String, Value>, field: &str, values: &[&str], issues: &mut Issues) {
    match present(args, field) {
        None => issues.push(field, "champ obligatoire manquant"),
        Some(Value::String(s)) if values.contains(&s.as_str()) => {}
        Some(other) => issues.push(
            field,
            format!("valeur {} non autorisée (attendu : {})", other, values.join(", ")),
        ),
    }
}

/// Check tool-call arguments and build the ticket.
///
/// Every issue is reported, including the network-type rule: `type_reseau`
/// is required when `materiel_declare` is true and must be absent or null
/// when it is false. Unknown fields are ignored.
pub fn validate_arguments(arguments: &str) -> Result<Ticket, TicketValidationError> {
    let value: Value = serde_json::from_str(arguments)
        .map_err(|e| TicketValidationError::single("arguments", format!("JSON invalide ({})", e)))?;

    let Value::Object(args) = &value else {
        return Err(TicketValidationError::single(
            "arguments",
            "un objet JSON est attendu",
        ));
    };

    let mut issues = Issues::default();

    for field in REQUIRED_TEXT {
        match present(args, field) {
            None => issues.push(field, "champ obligatoire manquant"),
            Some(Value::String(s)) if s.trim().is_empty() => {
                issues.push(field, "ne peut pas être vide")
            }
            Some(Value::String(_)) => {}
            Some(_) => issues.push(field, "une chaîne de caractères est attendue"),
        }
    }

    check_choice(args, "type_demande", RequestType::VALUES, &mut issues);
    check_choice(args, "site", Site::VALUES, &mut issues);

    let declared = match present(args, "materiel_declare") {
        None => {
            issues.push("materiel_declare", "champ obligatoire manquant");
            None
        }
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            issues.push("materiel_declare", "un booléen (true/false) est attendu");
            None
        }
    };

    match (declared, present(args, "type_reseau")) {
        (Some(false), Some(_)) => issues.push(
            "type_reseau",
            "doit être omis quand materiel_declare vaut false",
        ),
        (Some(true), None) => issues.push(
            "type_reseau",
            "obligatoire quand materiel_declare vaut true",
        ),
        (_, Some(Value::String(s))) if NetworkType::VALUES.contains(&s.as_str()) => {}
        (_, Some(other)) => issues.push(
            "type_reseau",
            format!(
                "valeur {} non autorisée (attendu : {})",
                other,
                NetworkType::VALUES.join(", ")
            ),
        ),
        (_, None) => {}
    }

    match present(args, "pieces_jointes") {
        None => {}
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => {}
        Some(_) => issues.push("pieces_jointes", "une liste de noms de fichiers est attendue"),
    }

    if !issues.0.is_empty() {
        return Err(TicketValidationError { issues: issues.0 });
    }

    serde_json::from_value(value.clone())
        .map_err(|e| TicketValidationError::single("arguments", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "personne_concernee": "Jean Dupont",
            "objet": "Pas de Wifi au bureau B134",
            "type_demande": "incident",
            "site": "CR",
            "numero_bureau_salle": "CR B134",
            "departement": "Génie Informatique",
            "telephone": "4567",
            "materiel_declare": true,
            "type_reseau": "Wifi",
            "description": "Le portable ne se connecte plus à eduroam."
        })
    }

    fn validate(value: &Value) -> Result<Ticket, TicketValidationError> {
        validate_arguments(&value.to_string())
    }

    #[test]
    fn test_valid_ticket() {
        let ticket = validate(&valid()).unwrap();
        assert_eq!(ticket.site, Site::CentreRecherche);
        assert_eq!(ticket.type_reseau, Some(NetworkType::Wifi));
        assert_eq!(ticket.pieces_jointes, None);
    }

    #[test]
    fn test_undeclared_material_without_network_type() {
        let mut args = valid();
        args["materiel_declare"] = json!(false);
        args["type_reseau"] = Value::Null;
        assert!(validate(&args).is_ok());

        args.as_object_mut().unwrap().remove("type_reseau");
        assert!(validate(&args).is_ok());
    }

    #[test]
    fn test_undeclared_material_with_network_type_fails() {
        let mut args = valid();
        args["materiel_declare"] = json!(false);
        let err = validate(&args).unwrap_err();
        assert_eq!(err.fields(), vec!["type_reseau"]);
    }

    #[test]
    fn test_declared_material_requires_network_type() {
        let mut args = valid();
        args.as_object_mut().unwrap().remove("type_reseau");
        let err = validate(&args).unwrap_err();
        assert_eq!(err.fields(), vec!["type_reseau"]);
    }

    #[test]
    fn test_collects_every_issue() {
        let mut args = valid();
        let obj = args.as_object_mut().unwrap();
        obj.remove("telephone");
        obj.insert("objet".into(), json!("  "));
        obj.insert("site".into(), json!("Lille"));
        obj.insert("materiel_declare".into(), json!("oui"));

        let err = validate(&args).unwrap_err();
        assert_eq!(err.fields(), vec!["objet", "telephone", "site", "materiel_declare"]);
        assert!(err.to_string().starts_with("4 champ(s) invalide(s)"));
    }

    #[test]
    fn test_closed_sets() {
        let mut args = valid();
        args["type_demande"] = json!("panne");
        args["type_reseau"] = json!("Fibre");
        let err = validate(&args).unwrap_err();
        assert_eq!(err.fields(), vec!["type_demande", "type_reseau"]);
    }

    #[test]
    fn test_attachments_must_be_strings() {
        let mut args = valid();
        args["pieces_jointes"] = json!(["capture.png"]);
        assert!(validate(&args).is_ok());

        args["pieces_jointes"] = json!([1, 2]);
        assert_eq!(validate(&args).unwrap_err().fields(), vec!["pieces_jointes"]);
    }

    #[test]
    fn test_invalid_json() {
        let err = validate_arguments("{not json").unwrap_err();
        assert_eq!(err.fields(), vec!["arguments"]);
        assert!(validate_arguments("[1]").is_err());
    }

    #[test]
    fn test_value_lists_match_serde_names() {
        for v in Site::VALUES {
            assert!(serde_json::from_value::<Site>(json!(v)).is_ok(), "{}", v);
        }
        for v in RequestType::VALUES {
            assert!(serde_json::from_value::<RequestType>(json!(v)).is_ok(), "{}", v);
        }
        for v in NetworkType::VALUES {
            assert!(serde_json::from_value::<NetworkType>(json!(v)).is_ok(), "{}", v);
        }
    }

    #[test]
    fn test_tool_schema_keeps_optional_fields_optional() {
        let def = CreateTicket.definition();
        let required: Vec<&str> = def.parameters["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"materiel_declare"));
        assert!(!required.contains(&"type_reseau"));
        assert!(!required.contains(&"pieces_jointes"));
    }
}
