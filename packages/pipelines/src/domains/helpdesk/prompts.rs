//! Prompts of the helpdesk assistant.

use openai_client::Message;

use super::ticket::FieldIssue;

/// Usual request families, given to the assistant as orientation.
const TOPICS: &str = "Demandes fréquentes reçues par la DSI :\
\n1. Authentification et accès : mot de passe oublié, accès refusé, compte bloqué.\
\n2. Réseau et connectivité : pas d'internet, Wi-Fi ou eduroam introuvable, VPN qui ne démarre pas (OpenVPN, GlobalProtect).\
\n3. Partages et stockage : lecteur réseau inaccessible, montage SMB, SFTP avec FileZilla, droits de lecture ou d'écriture.\
\n4. Messagerie : envoi ou réception bloqués (SMTP, IMAP), redirection des mails étudiants.\
\n5. Imprimantes et périphériques : imprimante introuvable, pilote manquant, spouleur.\
\n6. Performance : poste lent, démarrage trop long, agents de sécurité et d'inventaire.\
\n7. Sécurité : alerte virus, pare-feu, posture VPN.\
\n8. Téléphonie : renvoi d'appel, messagerie vocale, conférence à trois, parking d'appel.";

/// Structured keyword pick over the whole conversation.
///
/// The model must choose among `keywords` only, and none at all when the
/// user is not describing a problem.
pub fn keyword_selection_prompt(keywords: &[String], conversation: &[Message]) -> Vec<Message> {
    let list = keywords
        .iter()
        .map(|k| format!("\"{}\"", k))
        .collect::<Vec<_>>()
        .join(", ");

    let mut messages = vec![Message::system(format!(
        "Sélectionne tous les mots clés qui correspondent à peu près à la situation de l'utilisateur d'après la conversation.\
\nSi l'utilisateur ne décrit pas un problème (par exemple il est en train de remplir un ticket), ne sélectionne aucun mot clé.\
\nChoisis uniquement parmi la liste suivante : [{}]",
        list
    ))];
    messages.extend_from_slice(conversation);
    messages
}

/// The conversation followed by the assistant's rules and its knowledge.
pub fn assistant_prompt(conversation: &[Message], knowledge: &[String]) -> Vec<Message> {
    let mut messages = conversation.to_vec();
    messages.push(Message::system(format!(
        "Tu es l'assistant de la DSI (service informatique) de l'Université de Technologie de Compiègne (UTC).\
\n\nRègles de conduite :\
\n#1. Cherche toujours à cerner le problème de l'utilisateur avec lui. S'il sort du périmètre de la DSI et de la section Knowledge, recentre la conversation.\
\n#2. Une fois le problème ou le besoin clairement identifié, appuie-toi uniquement sur la section Knowledge si elle est pertinente. \
Si elle ne concerne pas le problème identifié, indique que l'assistance automatique ne peut pas aider.\
\n#3. N'inclus des liens http(s) que s'ils figurent dans la section Knowledge.\
\n#4. Ne propose un ticket que si l'utilisateur a appliqué tes instructions sans succès ou exprime clairement sa frustration. \
Les tickets sont réservés aux échanges où l'utilisateur a manifestement coopéré et où le problème persiste.\
\n\n{}\
\n\nKnowledge :\n{}",
        TOPICS,
        knowledge.join("\n\n")
    )));
    messages
}

/// Instruction appended after an invalid `create_ticket` call.
pub fn ticket_correction_note(issues: &[FieldIssue]) -> Message {
    let listed = issues
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n");

    Message::system(format!(
        "Les informations fournies pour le ticket sont invalides ou incomplètes :\n{}\
\nRedemande à l'utilisateur ce qui manque ou ce qui est incorrect en l'expliquant clairement, \
puis rappelle l'outil create_ticket avec les informations corrigées. \
Tous les champs obligatoires doivent être présents et les valeurs de type_demande, site et type_reseau doivent faire partie des choix proposés. \
Rappel : si materiel_declare vaut true, type_reseau est obligatoire ; si materiel_declare vaut false, type_reseau doit être omis ou null.",
        listed
    ))
}

/// Instruction appended when a proposed ticket was not confirmed.
pub fn ticket_cancelled_note() -> Message {
    Message::system(
        "Explique à l'utilisateur que l'envoi du ticket a été annulé car il n'a pas répondu par le mot clé \"envoyer\". \
S'il souhaite toujours l'envoyer, propose-lui de réutiliser l'outil create_ticket pour redemander confirmation.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use openai_client::Role;

    #[test]
    fn test_keyword_prompt_lists_keywords_first() {
        let conversation = vec![Message::user("Mon VPN ne démarre pas")];
        let prompt = keyword_selection_prompt(&["vpn".into(), "wifi".into()], &conversation);

        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt[0].role, Role::System);
        assert!(prompt[0].content.ends_with("[\"vpn\", \"wifi\"]"));
        assert_eq!(prompt[1], conversation[0]);
    }

    #[test]
    fn test_assistant_prompt_ends_with_knowledge() {
        let conversation = vec![Message::user("a"), Message::assistant("b")];
        let prompt = assistant_prompt(&conversation, &["note 1".into(), "note 2".into()]);

        assert_eq!(prompt.len(), 3);
        assert_eq!(prompt[2].role, Role::System);
        assert!(prompt[2].content.ends_with("Knowledge :\nnote 1\n\nnote 2"));
    }

    #[test]
    fn test_correction_note_lists_issues() {
        let note = ticket_correction_note(&[FieldIssue {
            field: "telephone".into(),
            problem: "champ obligatoire manquant".into(),
        }]);
        assert_eq!(note.role, Role::System);
        assert!(note.content.contains("- telephone : champ obligatoire manquant"));
        assert!(note.content.contains("type_reseau doit être omis"));
    }
}
