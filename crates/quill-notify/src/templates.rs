//! Plain-text email templates.
//!
//! Each template is a typed struct with `subject()` and `body()` render
//! methods. No HTML, no templating engine; the product sends short
//! transactional notes.

use uuid::Uuid;

/// Welcome email sent after registration.
#[derive(Debug, Clone)]
pub struct WelcomeEmail {
    pub first_name: String,
}

impl WelcomeEmail {
    pub fn subject(&self) -> String {
        "Welcome to Quillmark".to_string()
    }

    pub fn body(&self) -> String {
        format!(
            "Hi {},\n\n\
             Welcome to Quillmark! Your account is ready.\n\n\
             Start writing: create a note, organize it into folders, tag it,\n\
             and share it with a link when it's worth reading.\n\n\
             The Quillmark team",
            self.first_name
        )
    }
}

/// Notification sent to the owner when a note is created.
#[derive(Debug, Clone)]
pub struct NoteCreatedEmail {
    pub title: String,
    pub note_id: Uuid,
    pub app_url: String,
}

impl NoteCreatedEmail {
    pub fn subject(&self) -> String {
        format!("New note: {}", self.title)
    }

    /// Link to the note in the web app.
    pub fn note_link(&self) -> String {
        format!("{}/notes/{}", self.app_url.trim_end_matches('/'), self.note_id)
    }

    pub fn body(&self) -> String {
        format!(
            "Your note \"{}\" was created.\n\n\
             Open it here: {}\n\n\
             The Quillmark team",
            self.title,
            self.note_link()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_email_renders_name() {
        let email = WelcomeEmail {
            first_name: "Ada".to_string(),
        };
        assert_eq!(email.subject(), "Welcome to Quillmark");
        assert!(email.body().starts_with("Hi Ada,"));
        assert!(email.body().contains("Welcome to Quillmark"));
    }

    #[test]
    fn test_note_created_email_renders_title_and_link() {
        let note_id = Uuid::parse_str("01234567-89ab-cdef-0123-456789abcdef").unwrap();
        let email = NoteCreatedEmail {
            title: "Thesis outline".to_string(),
            note_id,
            app_url: "https://app.quillmark.app".to_string(),
        };

        assert_eq!(email.subject(), "New note: Thesis outline");
        assert_eq!(
            email.note_link(),
            format!("https://app.quillmark.app/notes/{}", note_id)
        );
        assert!(email.body().contains("Thesis outline"));
        assert!(email.body().contains(&email.note_link()));
    }

    #[test]
    fn test_note_link_tolerates_trailing_slash() {
        let email = NoteCreatedEmail {
            title: "t".to_string(),
            note_id: Uuid::nil(),
            app_url: "http://localhost:3000/".to_string(),
        };
        assert_eq!(
            email.note_link(),
            format!("http://localhost:3000/notes/{}", Uuid::nil())
        );
    }
}
