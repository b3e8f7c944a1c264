//! Renders the outbound mail for the account lifecycle. Each function takes
//! a typed context and returns a ready-to-send [`MailMessage`]; subjects are
//! collapsed to a single line before they leave this module.

use crate::account::SignupAccount;
use crate::mailer::MailMessage;
use crate::settings::AccountSettings;

/// Path under the site domain where an activation key is redeemed
pub const ACTIVATION_PATH: &str = "/accounts/activate";
/// Path under the site domain where an email-change key is redeemed
pub const CONFIRMATION_PATH: &str = "/accounts/confirm-email";

/// Everything the lifecycle templates interpolate
pub struct MailContext<'a> {
    pub account: &'a SignupAccount,
    pub settings: &'a AccountSettings,
    /// The key being mailed (activation or confirmation, depending on the template)
    pub key: &'a str,
}

impl MailContext<'_> {
    fn activation_link(&self) -> String {
        format!(
            "{}://{}{}/{}/",
            self.settings.scheme(),
            self.settings.site_domain,
            ACTIVATION_PATH,
            self.key
        )
    }

    fn confirmation_link(&self) -> String {
        format!(
            "{}://{}{}/{}/",
            self.settings.scheme(),
            self.settings.site_domain,
            CONFIRMATION_PATH,
            self.key
        )
    }
}

/// The message mailed right after signup
pub fn activation_email(ctx: &MailContext<'_>) -> MailMessage {
    let subject = single_line(&format!(
        "Activate your account at {}",
        ctx.settings.site_name
    ));

    let body = format!(
        "Dear {name},\n\n\
         Thank you for signing up at {site}.\n\n\
         To activate your account, please follow this link within {days} days:\n\n\
         {link}\n\n\
         Sincerely,\n\
         The {site} team",
        name = display_name(ctx.account),
        site = ctx.settings.site_name,
        days = ctx.settings.activation_days,
        link = ctx.activation_link(),
    );

    MailMessage { subject, body }
}

/// The one-time nudge for accounts whose key is close to expiry
pub fn activation_reminder_email(ctx: &MailContext<'_>, days_left: i64) -> MailMessage {
    let subject = single_line(&format!(
        "Your account at {} is still waiting for activation",
        ctx.settings.site_name
    ));

    let body = format!(
        "Dear {name},\n\n\
         Your account at {site} has not been activated yet. The activation\n\
         link below stops working in {days_left} day(s); after that the signup\n\
         is removed and you would have to register again:\n\n\
         {link}\n\n\
         Sincerely,\n\
         The {site} team",
        name = display_name(ctx.account),
        site = ctx.settings.site_name,
        link = ctx.activation_link(),
    );

    MailMessage { subject, body }
}

/// The notice sent to the CURRENT address when an email change is requested
pub fn confirmation_email_old(ctx: &MailContext<'_>, new_email: &str) -> MailMessage {
    let subject = single_line(&format!(
        "Email change requested at {}",
        ctx.settings.site_name
    ));

    let body = format!(
        "Dear {name},\n\n\
         A request was made to change the email address of your account at\n\
         {site} from {old_email} to {new_email}. A confirmation message has\n\
         been sent to the new address.\n\n\
         If you did not request this change, please contact the site\n\
         administrators; until the new address is confirmed, nothing changes.\n\n\
         Sincerely,\n\
         The {site} team",
        name = display_name(ctx.account),
        site = ctx.settings.site_name,
        old_email = ctx.account.email,
    );

    MailMessage { subject, body }
}

/// The confirmation message sent to the NEW address, carrying the key
pub fn confirmation_email_new(ctx: &MailContext<'_>, new_email: &str) -> MailMessage {
    let subject = single_line(&format!(
        "Confirm your new email address at {}",
        ctx.settings.site_name
    ));

    let body = format!(
        "Dear {name},\n\n\
         You requested that {new_email} become the email address of your\n\
         account at {site}. To confirm you control this address, please\n\
         follow the link below:\n\n\
         {link}\n\n\
         Sincerely,\n\
         The {site} team",
        name = display_name(ctx.account),
        site = ctx.settings.site_name,
        link = ctx.confirmation_link(),
    );

    MailMessage { subject, body }
}

fn display_name(account: &SignupAccount) -> &str {
    if account.full_name.is_empty() {
        account.username()
    } else {
        &account.full_name
    }
}

/// Collapses a rendered subject onto one line, mirroring how the mail RFCs
/// forbid bare newlines in headers
fn single_line(subject: &str) -> String {
    subject
        .split(['\r', '\n'])
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
