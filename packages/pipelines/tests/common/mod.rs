//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use pipelines_core::{PipeBody, PipeInput, PipeMessage, Valves};
use serde_json::{json, Value};

pub const CHAT_MODEL: &str = "chat-model";
pub const ANALYZE_MODEL: &str = "analyze-model";

/// Every valve set, generous limits.
pub fn valves() -> Valves {
    Valves {
        api_key: "sk-test".into(),
        endpoint: "http://llm.test/v1".into(),
        model_name_chat: CHAT_MODEL.into(),
        model_name_analyze: ANALYZE_MODEL.into(),
        token_limit_chat: "1000".into(),
        token_limit_analyze: "50".into(),
    }
}

/// A turn where the host's working copy equals what the client sent.
pub fn turn(messages: Vec<PipeMessage>) -> PipeInput {
    PipeInput::from_body(PipeBody {
        stream: true,
        model: "test".into(),
        messages,
        user: None,
    })
}

/// Leading system message carrying uploaded documents.
pub fn documents(docs: &[(&str, &str)]) -> PipeMessage {
    let blocks: Vec<String> = docs
        .iter()
        .enumerate()
        .map(|(i, (name, content))| {
            format!("<source id=\"{}\" name=\"{}\">{}</source>", i + 1, name, content)
        })
        .collect();
    PipeMessage::system(format!("Contexte :\n{}", blocks.join("\n")))
}

/// Complete, valid `create_ticket` arguments.
pub fn ticket_args() -> Value {
    json!({
        "personne_concernee": "Jean Dupont",
        "objet": "VPN inutilisable",
        "type_demande": "incident",
        "site": "PG2",
        "numero_bureau_salle": "PG2 204",
        "departement": "Génie Mécanique",
        "telephone": "4567",
        "materiel_declare": true,
        "type_reseau": "Filaire",
        "description": "Le client OpenVPN échoue à la connexion depuis lundi."
    })
}
