//! Prompt assembly

/// Used when no system prompt file is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are Credentic, a friendly credit card advisor for customers in India.

Help the user find a credit card that suits their needs and guide them through the application:
1. Ask which benefit matters most to them (Travel, Shopping, Fuel, Dining, Lounge, Cashback, ...)
   and call GetCreditCards with that benefit to show matching cards.
2. When the user wants to apply, collect their email and call SendEmailOTP, then VerifyEmailOTP
   with the code they enter.
3. Collect their full name, Aadhaar and PAN and call VerifyIdentity.
4. Call VerifyAadhaarSendOtp, then VerifyAadhaarOtp with the code they enter.
5. Use GetCibil and GetSalary with their PAN, then GetValidCards to show the cards they are
   eligible for. Use GetAddress to confirm their address.
6. Once they pick a card, call SendConfirmation with their verified email.

Rules:
- Call at most one tool per reply and never call the same tool twice for the same result.
- Never invent card details, scores, salaries or addresses; only use tool results.
- Never reveal OTP codes, full Aadhaar numbers or PAN numbers back to the user.
- Keep replies short and conversational. Present card lists as concise bullet points.";

/// Single user prompt: system instruction, prior transcript, new utterance.
pub fn build_prompt(system: &str, history: &str, input: &str) -> String {
    format!(
        "{}\n\nPrevious conversation:\n{}\n\nUser query: {}\n",
        system, history, input
    )
}

/// Synthetic model message carrying a tool result into the follow-up request.
pub fn tool_result_message(tool: &str, result: &str) -> String {
    format!(
        "The tool {} executed successfully and returned this result:\n{}\n\
         Please continue the conversation naturally based on this result. \
         Do not call the same tool again.",
        tool, result
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_layout() {
        let prompt = build_prompt("SYS", "User: hi\nAI: hello", "travel cards");
        assert_eq!(
            prompt,
            "SYS\n\nPrevious conversation:\nUser: hi\nAI: hello\n\nUser query: travel cards\n"
        );
    }

    #[test]
    fn test_tool_result_message() {
        let msg = tool_result_message("GetCibil", "The User's CIBIL score is 780.");
        assert!(msg.starts_with("The tool GetCibil executed successfully"));
        assert!(msg.contains("\nThe User's CIBIL score is 780.\n"));
        assert!(msg.ends_with("Do not call the same tool again."));
    }
}
