//! Prompts of the document analyzer.
//!
//! Pure functions: every variant is a synthesized system instruction followed
//! by the user/assistant part of the history.

use openai_client::Message;

use crate::common::{dialogue, PipeMessage};

const PREAMBLE: &str = "Tu es une interface d'analyse de documents. ";

const TABLE_RULES: &str = "\n\n#1. Une cellule contient soit un nombre avec son unité (12 pages, 3,5 kg, 2e), \
soit un mot clé, soit un paragraphe court. Les énumérations s'écrivent en phrase (a, b et c). \
Ne cite jamais de code ni de caractères propres au code.\
\n\n#2. Dans les cellules, uniquement des lettres, des chiffres et la ponctuation simple (,;:?!). \
Pas de retour à la ligne dans une cellule.\
\n\n#3. Un seul tableau au total : une ligne par document, une colonne par information demandée. \
La première colonne contient le nom du document.";

/// Situation the analyzer is in for this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// No document uploaded yet
    AwaitingDocuments,
    /// Documents are there; work out what the user wants to know
    ClarifyingRequest { documents: usize },
    /// A request was proposed but the user has not agreed to it
    AskForConfirmation,
    /// Classify whether the user agreed to start the analysis
    CheckConfirmation,
    /// Rewrite the synthesis draft as the final table
    ProcessOutput { draft: String },
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::AwaitingDocuments => "awaiting_documents",
            PromptKind::ClarifyingRequest { .. } => "clarifying_request",
            PromptKind::AskForConfirmation => "ask_for_confirmation",
            PromptKind::CheckConfirmation => "check_confirmation",
            PromptKind::ProcessOutput { .. } => "process_output",
        }
    }

    fn instruction(&self) -> String {
        let body = match self {
            PromptKind::AwaitingDocuments => "Aucun document ne t'a encore été transmis. \
Invite l'utilisateur à en déposer dans la fenêtre de discussion (glisser-déposer) \
afin que tu puisses y rechercher des informations."
                .to_string(),
            PromptKind::ClarifyingRequest { documents } => format!(
                "L'utilisateur a déposé {} document(s). Tu n'y as pas accès tant que l'analyse n'est pas lancée. \
Procède ainsi :\
\n#1. Demande à l'utilisateur ce qu'il cherche dans ces documents.\
\n#2. Tant que le besoin reste flou, échange brièvement avec lui pour le préciser ; \
tes suggestions restent courtes (\"on pourrait relever les dates de chaque échéance, cela vous convient ?\").\
\n#3. Quand le besoin est clair, reformule-le en liste d'informations à extraire et demande-lui si elle lui convient.\
\n#4. Dès que l'utilisateur sait que cette liste servira à l'analyse et l'a validée, \
appelle l'outil analyze_documents avec cette liste.",
                documents
            ),
            PromptKind::AskForConfirmation => "Des documents ont été déposés et une liste d'informations à rechercher a été proposée. \
L'analyse ne démarre qu'après un accord explicite de l'utilisateur sur cette liste. \
Demande-lui cette confirmation ; il peut encore modifier sa demande."
                .to_string(),
            PromptKind::CheckConfirmation => "Réponds de façon structurée. \
Indique si l'utilisateur a demandé de lancer l'analyse des documents, \
ou s'il a simplement répondu favorablement à une demande de confirmation de l'assistant. \
S'il a fait une remarque, refusé ou changé de sujet, les deux réponses sont négatives."
                .to_string(),
            PromptKind::ProcessOutput { draft } => format!(
                "\n\nPrésente les résultats du brouillon dans un unique tableau markdown, \
écrit directement dans ta réponse sans bloc ```markdown.{}\
\n\nBrouillon à mettre en forme : {}",
                TABLE_RULES, draft
            ),
        };
        format!("{}{}", PREAMBLE, body)
    }
}

/// System instruction for `kind`, then the dialogue part of `history`.
pub fn make_prompt(kind: &PromptKind, history: &[PipeMessage]) -> Vec<Message> {
    let mut messages = vec![Message::system(kind.instruction())];
    messages.extend(dialogue(history));
    messages
}

/// Single-document extraction request, sent to the analyze model.
pub fn per_document_prompt(information_request: &str, document: &str) -> Vec<Message> {
    vec![Message::system(format!(
        "Réponds en détail aux questions de l'utilisateur à propos du document.\
\n\n## Questions : {}\
\n\n## Document : {}",
        information_request, document
    ))]
}

/// Synthesis of per-document answers into a draft table.
///
/// `rows` pairs a document name with the analyze model's answer for it.
pub fn synthesis_prompt(rows: &[(String, String)]) -> Vec<Message> {
    let answers = if rows.is_empty() {
        "Aucun résultat trouvé.".to_string()
    } else {
        rows.iter()
            .map(|(name, answer)| format!("| {} | {} |", name, answer))
            .collect::<Vec<_>>()
            .join("\n")
    };

    vec![Message::system(format!(
        "Tu as reçu, pour chaque document fourni par l'utilisateur, les réponses à ses questions. \
Regroupe-les dans un unique tableau markdown homogène : \
une ligne par document, une colonne par question.{}\
\n\nRéponses brutes à réorganiser :\n{}",
        TABLE_RULES, answers
    ))]
}
