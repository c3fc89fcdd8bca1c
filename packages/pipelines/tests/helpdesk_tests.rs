//! Helpdesk turn flows against a scripted LLM and the bundled knowledge base.

mod common;

use std::sync::Arc;

use crate::common::{ticket_args, turn, valves, ANALYZE_MODEL, CHAT_MODEL};
use pipelines_core::domains::helpdesk::knowledge;
use pipelines_core::domains::helpdesk::pipeline::TICKET_SENT;
use pipelines_core::domains::helpdesk::{Helpdesk, KeywordSelection};
use pipelines_core::domains::CONVERSATION_TOO_LONG;
use pipelines_core::kernel::{LlmCallKind, MockLLM};
use pipelines_core::{PipeEvent, PipeMessage, PipeOutput, Pipeline, VALVES_REFUSAL};

// ============================================================================
// Test Helpers
// ============================================================================

fn helpdesk(llm: &Arc<MockLLM>) -> Helpdesk {
    let store = knowledge::load(None).unwrap();
    Helpdesk::new(llm.clone(), store, valves())
}

fn selection(keywords: &[&str]) -> KeywordSelection {
    KeywordSelection {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

fn texts(events: &[PipeEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(PipeEvent::as_text)
        .map(str::to_string)
        .collect()
}

const PROPOSAL: &str = "[TICKET] {}\n\nRépondez \"envoyer\" pour envoyer le ticket.";

// ============================================================================
// Short-circuits
// ============================================================================

#[tokio::test]
async fn send_keyword_after_proposal_confirms_without_calls() {
    let llm = Arc::new(MockLLM::new());
    let pipeline = helpdesk(&llm);

    let history = vec![
        PipeMessage::user("Mon VPN ne marche pas"),
        PipeMessage::assistant(PROPOSAL),
        PipeMessage::user("Envoyer"),
    ];
    let output = pipeline.pipe(turn(history)).await;

    assert!(matches!(&output, PipeOutput::Text(t) if t == TICKET_SENT));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn analyze_limit_is_not_required() {
    let llm = Arc::new(MockLLM::new().with_structured(&selection(&[])).with_text_stream(&["Bonjour !"]));
    let mut v = valves();
    v.token_limit_analyze = String::new();
    let pipeline = Helpdesk::new(llm.clone(), knowledge::load(None).unwrap(), v);

    let text = pipeline.pipe(turn(vec![PipeMessage::user("Bonjour")])).await.collect_text().await;

    assert_eq!(text, "Bonjour !");
}

#[tokio::test]
async fn missing_chat_model_refuses() {
    let llm = Arc::new(MockLLM::new());
    let mut v = valves();
    v.model_name_chat = "  ".into();
    let pipeline = Helpdesk::new(llm.clone(), knowledge::load(None).unwrap(), v);

    let text = pipeline.pipe(turn(vec![PipeMessage::user("Bonjour")])).await.collect_text().await;

    assert_eq!(text, VALVES_REFUSAL);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn long_conversation_is_refused_before_keyword_selection() {
    let llm = Arc::new(MockLLM::new());
    let mut v = valves();
    v.token_limit_chat = "20".into();
    let pipeline = Helpdesk::new(llm.clone(), knowledge::load(None).unwrap(), v);

    let history = vec![
        PipeMessage::user("Mon imprimante ".repeat(10)),
        PipeMessage::assistant("Laquelle ?"),
        PipeMessage::user("Celle du couloir"),
    ];
    let text = pipeline.pipe(turn(history)).await.collect_text().await;

    assert_eq!(text, CONVERSATION_TOO_LONG);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn keyword_selection_failure_is_reported_as_text() {
    let llm = Arc::new(MockLLM::new().with_raw_structured("pas du json"));
    let pipeline = helpdesk(&llm);

    let output = pipeline.pipe(turn(vec![PipeMessage::user("Aide")])).await;

    let PipeOutput::Text(text) = output else {
        panic!("expected a text output");
    };
    assert!(text.starts_with("Erreur : serde_json::Error Keyword selection failed"));
    assert_eq!(llm.calls_of(LlmCallKind::Stream).len(), 0);
}

// ============================================================================
// Retrieval and answer
// ============================================================================

#[tokio::test]
async fn selected_notes_reach_the_chat_prompt() {
    let llm = Arc::new(
        MockLLM::new()
            .with_structured(&selection(&["vpn-ne-demarre-pas"]))
            .with_text_stream(&["Ouvrez ", "le fichier .ovpn."]),
    );
    let pipeline = helpdesk(&llm);

    let history = vec![PipeMessage::user("Mon VPN ne démarre pas")];
    let text = pipeline.pipe(turn(history)).await.collect_text().await;

    assert_eq!(text, "Ouvrez le fichier .ovpn.");

    let selection_call = &llm.calls_of(LlmCallKind::Structured)[0];
    assert_eq!(selection_call.model, ANALYZE_MODEL);
    assert!(selection_call.messages[0].content.contains("\"vpn-ne-demarre-pas\""));
    assert_eq!(selection_call.messages[1].content, "Mon VPN ne démarre pas");

    let chat = &llm.calls_of(LlmCallKind::Stream)[0];
    assert_eq!(chat.model, CHAT_MODEL);
    assert_eq!(chat.schema_or_tools, vec!["create_ticket".to_string()]);
    assert_eq!(chat.messages[0].content, "Mon VPN ne démarre pas");
    let instruction = &chat.messages.last().unwrap().content;
    assert!(instruction.contains("Knowledge :\n"));
    assert!(instruction.contains(".ovpn"));
}

#[tokio::test]
async fn unknown_keywords_leave_knowledge_empty() {
    let llm = Arc::new(
        MockLLM::new()
            .with_structured(&selection(&["cafetiere-en-panne"]))
            .with_text_stream(&["Hors périmètre."]),
    );
    let pipeline = helpdesk(&llm);

    pipeline
        .pipe(turn(vec![PipeMessage::user("La cafetière fuit")]))
        .await
        .collect_text()
        .await;

    let chat = &llm.calls_of(LlmCallKind::Stream)[0];
    assert!(chat.messages.last().unwrap().content.ends_with("Knowledge :\n"));
}

#[tokio::test]
async fn unconfirmed_ticket_adds_cancellation_note() {
    let llm = Arc::new(MockLLM::new().with_structured(&selection(&[])).with_text_stream(&["D'accord."]));
    let pipeline = helpdesk(&llm);

    let history = vec![
        PipeMessage::user("Mon VPN ne marche pas"),
        PipeMessage::assistant(PROPOSAL),
        PipeMessage::user("Finalement non"),
    ];
    pipeline.pipe(turn(history)).await.collect_text().await;

    let chat = &llm.calls_of(LlmCallKind::Stream)[0];
    let last = chat.messages.last().unwrap();
    assert!(last.content.contains("annulé"));
    assert!(last.content.contains("\"envoyer\""));
}

// ============================================================================
// Tickets
// ============================================================================

#[tokio::test]
async fn valid_ticket_is_shown_for_confirmation() {
    let llm = Arc::new(
        MockLLM::new()
            .with_structured(&selection(&["erreur-openvpn"]))
            .with_tool_call_stream(&["Je prépare le ticket.\n"], "create_ticket", &ticket_args().to_string()),
    );
    let pipeline = helpdesk(&llm);

    let events = pipeline
        .pipe(turn(vec![PipeMessage::user("Toujours en panne, faites un ticket")]))
        .await
        .collect_events()
        .await;
    let fragments = texts(&events);

    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0], "Je prépare le ticket.\n");
    assert!(fragments[1].starts_with("[TICKET] {\n"));
    assert!(fragments[1].contains("\"personne_concernee\": \"Jean Dupont\""));
    assert!(fragments[1].ends_with("Répondez \"envoyer\" pour envoyer le ticket."));
    assert_eq!(llm.calls_of(LlmCallKind::Stream).len(), 1);
}

#[tokio::test]
async fn invalid_ticket_gets_one_correction_round() {
    let mut invalid = ticket_args();
    invalid["site"] = "Lune".into();

    let llm = Arc::new(
        MockLLM::new()
            .with_structured(&selection(&[]))
            .with_tool_call_stream(&[], "create_ticket", &invalid.to_string())
            .with_tool_call_stream(&["Corrigé.\n"], "create_ticket", &ticket_args().to_string()),
    );
    let pipeline = helpdesk(&llm);

    let fragments = texts(
        &pipeline
            .pipe(turn(vec![PipeMessage::user("Ticket svp")]))
            .await
            .collect_events()
            .await,
    );

    assert_eq!(fragments.len(), 3);
    assert!(fragments[0].starts_with("Erreur lors de la création du ticket : "));
    assert!(fragments[0].contains("site"));
    assert!(fragments[0].ends_with("\n\n"));
    assert_eq!(fragments[1], "Corrigé.\n");
    assert!(fragments[2].starts_with("[TICKET] "));

    let streams = llm.calls_of(LlmCallKind::Stream);
    assert_eq!(streams.len(), 2);
    assert_eq!(streams[1].messages.len(), streams[0].messages.len() + 1);
    let note = &streams[1].messages.last().unwrap().content;
    assert!(note.contains("- site : "));
}

#[tokio::test]
async fn second_invalid_ticket_ends_the_turn() {
    let mut invalid = ticket_args();
    invalid["materiel_declare"] = false.into();

    let llm = Arc::new(
        MockLLM::new()
            .with_structured(&selection(&[]))
            .with_tool_call_stream(&[], "create_ticket", &invalid.to_string())
            .with_tool_call_stream(&[], "create_ticket", &invalid.to_string())
            .with_text_stream(&["jamais lu"]),
    );
    let pipeline = helpdesk(&llm);

    let fragments = texts(
        &pipeline
            .pipe(turn(vec![PipeMessage::user("Ticket svp")]))
            .await
            .collect_events()
            .await,
    );

    assert_eq!(fragments.len(), 2);
    assert!(fragments
        .iter()
        .all(|f| f.starts_with("Erreur lors de la création du ticket : ") && f.contains("type_reseau")));
    assert_eq!(llm.calls_of(LlmCallKind::Stream).len(), 2);
}

#[tokio::test]
async fn corrected_ticket_can_be_sent_next_turn() {
    let mut invalid = ticket_args();
    invalid["site"] = "Lune".into();

    let llm = Arc::new(
        MockLLM::new()
            .with_structured(&selection(&[]))
            .with_tool_call_stream(&[], "create_ticket", &invalid.to_string())
            .with_tool_call_stream(&[], "create_ticket", &ticket_args().to_string()),
    );
    let pipeline = helpdesk(&llm);

    let answer = pipeline
        .pipe(turn(vec![PipeMessage::user("Ticket svp")]))
        .await
        .collect_text()
        .await;
    assert!(answer.starts_with("Erreur lors de la création du ticket : "));
    assert!(answer.contains("\n[TICKET] {"));

    let follow_up = Arc::new(MockLLM::new());
    let history = vec![
        PipeMessage::user("Ticket svp"),
        PipeMessage::assistant(answer),
        PipeMessage::user("envoyer"),
    ];
    let text = helpdesk(&follow_up).pipe(turn(history)).await.collect_text().await;

    assert_eq!(text, TICKET_SENT);
    assert_eq!(follow_up.call_count(), 0);
}

#[tokio::test]
async fn ticket_after_unterminated_text_opens_its_own_line() {
    let llm = Arc::new(
        MockLLM::new()
            .with_structured(&selection(&[]))
            .with_tool_call_stream(&["Voici le ticket."], "create_ticket", &ticket_args().to_string()),
    );
    let pipeline = helpdesk(&llm);

    let answer = pipeline
        .pipe(turn(vec![PipeMessage::user("Ticket svp")]))
        .await
        .collect_text()
        .await;
    assert!(answer.starts_with("Voici le ticket.\n\n[TICKET] {"));

    let history = vec![
        PipeMessage::user("Ticket svp"),
        PipeMessage::assistant(answer),
        PipeMessage::user("Envoyer"),
    ];
    let text = helpdesk(&Arc::new(MockLLM::new())).pipe(turn(history)).await.collect_text().await;
    assert_eq!(text, TICKET_SENT);
}

#[tokio::test]
async fn stream_failure_is_reported_and_ends_the_turn() {
    let llm = Arc::new(
        MockLLM::new()
            .with_structured(&selection(&[]))
            .with_failing_stream(&["Voici"], "upstream closed"),
    );
    let pipeline = helpdesk(&llm);

    let events = pipeline
        .pipe(turn(vec![PipeMessage::user("Bonjour")]))
        .await
        .collect_events()
        .await;

    assert_eq!(
        events,
        vec![
            PipeEvent::text("Voici"),
            PipeEvent::text("Erreur : OpenAIError::Network Network error: upstream closed"),
        ]
    );
}
