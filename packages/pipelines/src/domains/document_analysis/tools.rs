//! Model-facing schemas of the document analyzer.

use openai_client::ToolSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeDocumentsArgs {
    /// Les informations à rechercher, en précisant dès que possible le format, l'unité ou la mesure attendue pour chacune.
    pub information_request: String,
}

/// Declared to the chat model; intercepted, never executed.
pub struct AnalyzeDocuments;

impl ToolSpec for AnalyzeDocuments {
    const NAME: &'static str = "analyze_documents";
    type Args = AnalyzeDocumentsArgs;

    fn description(&self) -> &str {
        "Recherche dans les documents les informations demandées par l'utilisateur. \
information_request décrit le plus précisément possible chaque information attendue, \
par exemple \"le nom et le prénom de chaque personne citée, la date de signature au format jour mois année\". \
Précise les unités ou formats dès que possible (nombre de pages, liste de mots uniques, ...)."
    }
}

/// Whether the user agreed to start the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConfirmationCheck {
    /// L'utilisateur a-t-il demandé ou ordonné de lancer l'analyse ?
    pub they_said_do_analyze: bool,
    /// L'utilisateur a-t-il répondu positivement (oui, ok, d'accord, ...) ?
    pub they_said_yes: bool,
}

impl ConfirmationCheck {
    pub fn confirmed(&self) -> bool {
        self.they_said_do_analyze || self.they_said_yes
    }
}
