use crate::role::ClassRole;

/// Rendered parts of an invitation e-mail.
pub struct InvitationEmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl InvitationEmailContent {
    pub fn new(classroom_name: &str, role: ClassRole, invite_link: &str) -> Self {
        Self {
            subject: format!("Invitation to join {}", classroom_name),
            text: Self::text_template(classroom_name, role, invite_link),
            html: Self::html_template(classroom_name, role, invite_link),
        }
    }

    fn text_template(classroom_name: &str, role: ClassRole, invite_link: &str) -> String {
        format!(
            r#"Hello,

You have been invited to join the classroom "{}" as a {}.

Accept the invitation by opening this link:

{}

The link expires; if it no longer works, ask for a new invitation.

If you didn't expect this invitation, please ignore this email."#,
            classroom_name, role, invite_link
        )
    }

    fn html_template(classroom_name: &str, role: ClassRole, invite_link: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background: #f5f5f5; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 40px 20px; }}
        .card {{ background: white; border-radius: 8px; padding: 40px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        h1 {{ color: #1a1a1a; margin-top: 0; font-size: 24px; }}
        .role {{ font-weight: bold; }}
        .button {{ display: inline-block; padding: 12px 24px; background: #2563eb; color: #fff; border-radius: 6px; text-decoration: none; }}
        .footer {{ margin-top: 32px; padding-top: 20px; border-top: 1px solid #eee; color: #888; font-size: 12px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="card">
            <h1>Classroom invitation</h1>
            <p>You have been invited to join <strong>{}</strong> as a <span class="role">{}</span>.</p>
            <p><a class="button" href="{}">Join the classroom</a></p>
            <div class="footer">
                <p>The link expires; if it no longer works, ask for a new invitation.</p>
                <p>If you didn't expect this invitation, please ignore this email.</p>
            </div>
        </div>
    </div>
</body>
</html>"#,
            classroom_name, role, invite_link
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_contains_classroom_and_link() {
        let content = InvitationEmailContent::new(
            "Algebra I",
            ClassRole::Student,
            "http://localhost:3000/invite/TOKEN",
        );

        assert!(content.subject.contains("Algebra I"));
        assert!(content.text.contains("Algebra I"));
        assert!(content.text.contains("http://localhost:3000/invite/TOKEN"));
        assert!(content.html.contains("Algebra I"));
        assert!(content.html.contains("http://localhost:3000/invite/TOKEN"));
    }

    #[test]
    fn content_names_the_invited_role() {
        let student = InvitationEmailContent::new("Algebra I", ClassRole::Student, "link");
        let teacher = InvitationEmailContent::new("Algebra I", ClassRole::Teacher, "link");

        assert!(student.text.contains("Student"));
        assert!(student.html.contains("Student"));
        assert!(teacher.text.contains("Teacher"));
        assert!(teacher.html.contains("Teacher"));
    }

    #[test]
    fn html_template_is_a_document() {
        let content = InvitationEmailContent::new("Algebra I", ClassRole::Teacher, "link");

        assert!(content.html.contains("<!DOCTYPE html>"));
    }
}
