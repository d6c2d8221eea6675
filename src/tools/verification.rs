//! OTP and confirmation tools

use super::{ParamKind, ParamSpec, Tool, ToolArgs, ToolContext};
use crate::error::AssistantError;
use crate::mail::{confirmation_mail, Mailer};
use crate::otp::{OtpChannel, OtpSimulator};
use crate::validation::{is_valid_aadhaar, is_valid_email, is_valid_otp, mask_mobile};
use crate::Result;
use std::sync::Arc;
use tracing::{info, warn};

const EMAIL_PARAMS: &[ParamSpec] = &[ParamSpec::required("email", ParamKind::String, "Applicant's email address")];

pub struct SendEmailOtpTool {
    otp: Arc<OtpSimulator>,
}

impl SendEmailOtpTool {
    pub fn new(otp: Arc<OtpSimulator>) -> Self {
        Self { otp }
    }
}

#[async_trait::async_trait]
impl Tool for SendEmailOtpTool {
    fn name(&self) -> &'static str {
        "SendEmailOTP"
    }

    fn description(&self) -> &'static str {
        "Send an OTP to the user's email address for verification"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        EMAIL_PARAMS
    }

    async fn execute(&self, ctx: &ToolContext, args: &ToolArgs) -> Result<String> {
        let email = args.text("email").unwrap_or_default();
        if !is_valid_email(&email) {
            return Ok("Invalid email".to_string());
        }

        match self.otp.issue_email_otp(ctx.session_id, &email).await {
            Ok(_) => Ok(format!("OTP sent to email successfully: {}", email)),
            Err(AssistantError::MailError(_)) | Err(AssistantError::UpstreamUnavailable(_)) => Ok(format!(
                "Failed to send OTP to {}. Please check the email address and try again.",
                email
            )),
            Err(e) => Err(e),
        }
    }
}

const EMAIL_OTP_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("email", ParamKind::String, "Email address the OTP was sent to"),
    ParamSpec::required("otp", ParamKind::String, "6-digit OTP entered by the user"),
];

pub struct VerifyEmailOtpTool {
    otp: Arc<OtpSimulator>,
}

impl VerifyEmailOtpTool {
    pub fn new(otp: Arc<OtpSimulator>) -> Self {
        Self { otp }
    }
}

#[async_trait::async_trait]
impl Tool for VerifyEmailOtpTool {
    fn name(&self) -> &'static str {
        "VerifyEmailOTP"
    }

    fn description(&self) -> &'static str {
        "Verify the OTP the user received by email"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        EMAIL_OTP_PARAMS
    }

    async fn execute(&self, ctx: &ToolContext, args: &ToolArgs) -> Result<String> {
        let email = args.text("email").unwrap_or_default();
        let code = args.text("otp").unwrap_or_default();

        if !is_valid_email(&email) {
            return Ok("Invalid email format.".to_string());
        }
        if !is_valid_otp(&code) {
            return Ok("Invalid OTP format. OTP should be 6 digits.".to_string());
        }

        match self.otp.verify(ctx.session_id, OtpChannel::Email, &email, &code) {
            Ok(()) => {
                info!(session_id = %ctx.session_id, email = %email, "Email verified");
                Ok("Thank you. Your email has been successfully verified.".to_string())
            }
            Err(failure) => {
                warn!(session_id = %ctx.session_id, email = %email, %failure, "Email OTP rejected");
                Ok(format!("Invalid or expired OTP ({}). Please try again.", failure))
            }
        }
    }
}

const AADHAAR_PARAMS: &[ParamSpec] = &[ParamSpec::required("aadhaar", ParamKind::String, "12-digit Aadhaar number")];

pub struct VerifyAadhaarSendOtpTool {
    otp: Arc<OtpSimulator>,
}

impl VerifyAadhaarSendOtpTool {
    pub fn new(otp: Arc<OtpSimulator>) -> Self {
        Self { otp }
    }
}

#[async_trait::async_trait]
impl Tool for VerifyAadhaarSendOtpTool {
    fn name(&self) -> &'static str {
        "VerifyAadhaarSendOtp"
    }

    fn description(&self) -> &'static str {
        "Send an OTP to the mobile number linked with the user's Aadhaar"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        AADHAAR_PARAMS
    }

    async fn execute(&self, ctx: &ToolContext, args: &ToolArgs) -> Result<String> {
        let aadhaar = args.text("aadhaar").unwrap_or_default();
        if !is_valid_aadhaar(&aadhaar) {
            return Ok("Invalid Aadhaar number format. Please enter a valid 12-digit Aadhaar.".to_string());
        }

        match self.otp.issue_aadhaar_otp(ctx.session_id, &aadhaar).await {
            Ok(issued) => Ok(format!(
                "OTP sent to your Aadhaar-linked mobile number ending with {}. \
                 Please enter the OTP to continue.",
                mask_mobile(&issued.delivered_to)
            )),
            Err(AssistantError::NotFound(_)) => Ok("No mobile linked to this Aadhaar number.".to_string()),
            Err(e) => Err(e),
        }
    }
}

const AADHAAR_OTP_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("aadhaar", ParamKind::String, "12-digit Aadhaar number"),
    ParamSpec::required("otp", ParamKind::String, "6-digit OTP entered by the user"),
];

pub struct VerifyAadhaarOtpTool {
    otp: Arc<OtpSimulator>,
}

impl VerifyAadhaarOtpTool {
    pub fn new(otp: Arc<OtpSimulator>) -> Self {
        Self { otp }
    }
}

#[async_trait::async_trait]
impl Tool for VerifyAadhaarOtpTool {
    fn name(&self) -> &'static str {
        "VerifyAadhaarOtp"
    }

    fn description(&self) -> &'static str {
        "Verify the OTP sent to the user's Aadhaar-linked mobile number"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        AADHAAR_OTP_PARAMS
    }

    async fn execute(&self, ctx: &ToolContext, args: &ToolArgs) -> Result<String> {
        let aadhaar = args.text("aadhaar").unwrap_or_default();
        let code = args.text("otp").unwrap_or_default();

        if !is_valid_aadhaar(&aadhaar) {
            return Ok("Invalid Aadhaar number format. Please enter a valid 12-digit Aadhaar.".to_string());
        }
        if !is_valid_otp(&code) {
            return Ok("Invalid OTP format. OTP should be 6 digits.".to_string());
        }

        match self.otp.verify(ctx.session_id, OtpChannel::Aadhaar, &aadhaar, &code) {
            Ok(()) => Ok("Aadhaar verified successfully!".to_string()),
            Err(failure) => Ok(format!("Verification failed: {}", failure)),
        }
    }
}

pub struct SendConfirmationTool {
    mailer: Arc<dyn Mailer>,
}

impl SendConfirmationTool {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }
}

#[async_trait::async_trait]
impl Tool for SendConfirmationTool {
    fn name(&self) -> &'static str {
        "SendConfirmation"
    }

    fn description(&self) -> &'static str {
        "Send the credit card application confirmation email to the user"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        EMAIL_PARAMS
    }

    async fn execute(&self, _ctx: &ToolContext, args: &ToolArgs) -> Result<String> {
        let email = args.text("email").unwrap_or_default();
        if !is_valid_email(&email) {
            return Ok("Failed to send confirmation email. Please check the email address.".to_string());
        }

        match self.mailer.send(&confirmation_mail(&email)).await {
            Ok(()) => Ok(format!("Confirmation email sent to: {}", email)),
            Err(e) => {
                warn!(email = %email, error = %e, "Confirmation email failed");
                Ok("Failed to send confirmation email. Please check the email address.".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::memory::fixtures::sample_dataset;
    use crate::lookup::{InMemoryLookup, LookupStore};
    use crate::mail::LogMailer;
    use crate::otp::SIMULATED_AADHAAR_OTP;
    use crate::tools::testing::ctx;
    use serde_json::json;

    fn args(value: serde_json::Value) -> ToolArgs {
        ToolArgs::new(value.as_object().cloned().unwrap())
    }

    fn setup() -> (Arc<OtpSimulator>, Arc<LogMailer>) {
        let lookup: Arc<dyn LookupStore> = Arc::new(InMemoryLookup::new(sample_dataset()));
        let mailer = Arc::new(LogMailer::new());
        let otp = Arc::new(OtpSimulator::new(lookup, mailer.clone()));
        (otp, mailer)
    }

    #[tokio::test]
    async fn test_email_otp_flow() {
        let (otp, mailer) = setup();
        let send = SendEmailOtpTool::new(otp.clone());
        let verify = VerifyEmailOtpTool::new(otp.clone());
        let ctx = ctx();

        let sent = send.execute(&ctx, &args(json!({"email": "ravi@example.com"}))).await.unwrap();
        assert_eq!(sent, "OTP sent to email successfully: ravi@example.com");

        let code = otp
            .record(ctx.session_id, OtpChannel::Email, "ravi@example.com")
            .unwrap()
            .code;
        assert!(mailer.outbox().await[0].body.contains(&code));

        let wrong_code = if code == "000000" { "111111" } else { "000000" };
        let wrong = verify
            .execute(&ctx, &args(json!({"email": "ravi@example.com", "otp": wrong_code})))
            .await
            .unwrap();
        assert_eq!(wrong, "Invalid or expired OTP (Invalid OTP). Please try again.");

        let ok = verify
            .execute(&ctx, &args(json!({"email": "ravi@example.com", "otp": code})))
            .await
            .unwrap();
        assert_eq!(ok, "Thank you. Your email has been successfully verified.");
    }

    #[tokio::test]
    async fn test_email_otp_rejections() {
        let (otp, mailer) = setup();
        let send = SendEmailOtpTool::new(otp.clone());
        let verify = VerifyEmailOtpTool::new(otp);

        assert_eq!(
            send.execute(&ctx(), &args(json!({"email": "not-an-email"}))).await.unwrap(),
            "Invalid email"
        );
        assert!(mailer.outbox().await.is_empty());

        assert_eq!(
            verify
                .execute(&ctx(), &args(json!({"email": "a@b.com", "otp": "12ab"})))
                .await
                .unwrap(),
            "Invalid OTP format. OTP should be 6 digits."
        );
        assert_eq!(
            verify
                .execute(&ctx(), &args(json!({"email": "a@b.com", "otp": "123456"})))
                .await
                .unwrap(),
            "Invalid or expired OTP (No OTP found for this email). Please try again."
        );
    }

    #[tokio::test]
    async fn test_aadhaar_otp_flow() {
        let (otp, _) = setup();
        let send = VerifyAadhaarSendOtpTool::new(otp.clone());
        let verify = VerifyAadhaarOtpTool::new(otp);
        let ctx = ctx();

        let sent = send.execute(&ctx, &args(json!({"aadhaar": "123456789012"}))).await.unwrap();
        assert!(sent.contains("ending with 91*****210"));

        let wrong = verify
            .execute(&ctx, &args(json!({"aadhaar": "123456789012", "otp": "000000"})))
            .await
            .unwrap();
        assert_eq!(wrong, "Verification failed: Invalid OTP");

        let ok = verify
            .execute(&ctx, &args(json!({"aadhaar": "123456789012", "otp": SIMULATED_AADHAAR_OTP})))
            .await
            .unwrap();
        assert_eq!(ok, "Aadhaar verified successfully!");
    }

    #[tokio::test]
    async fn test_aadhaar_without_mobile() {
        let (otp, _) = setup();
        let send = VerifyAadhaarSendOtpTool::new(otp.clone());
        let verify = VerifyAadhaarOtpTool::new(otp);

        assert_eq!(
            send.execute(&ctx(), &args(json!({"aadhaar": "222222222222"}))).await.unwrap(),
            "No mobile linked to this Aadhaar number."
        );
        assert_eq!(
            verify
                .execute(&ctx(), &args(json!({"aadhaar": "222222222222", "otp": "197653"})))
                .await
                .unwrap(),
            "Verification failed: No OTP found for this Aadhaar"
        );
    }

    #[tokio::test]
    async fn test_send_confirmation() {
        let mailer = Arc::new(LogMailer::new());
        let tool = SendConfirmationTool::new(mailer.clone());

        let out = tool.execute(&ctx(), &args(json!({"email": "ravi@example.com"}))).await.unwrap();
        assert_eq!(out, "Confirmation email sent to: ravi@example.com");

        let outbox = mailer.outbox().await;
        assert_eq!(outbox[0].to, vec!["ravi@example.com".to_string()]);
        assert_eq!(outbox[0].subject, "Credit Card Application Confirmation");
    }
}
