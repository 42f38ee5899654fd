//! Canned-reply generator for the chat widget.
//!
//! Keyword substring matching over the lower-cased input, first match wins.
//! Deterministic: same message + same profile always produces the same reply.

use crate::domain::models::ChatUser;
use serde_json::Value;

/// Contact details interpolated into the canned templates. Built from the
/// stored user when the message carries a resolvable user id, else from the
/// request's `userInfo` snapshot, else placeholders.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Profile {
    pub fn anonymous() -> Self {
        Self {
            name: "there".to_string(),
            email: "your registered email".to_string(),
            phone: "your registered phone".to_string(),
        }
    }

    pub fn from_user(user: &ChatUser) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }

    /// Pull name/email/phone out of a client-supplied `userInfo` object,
    /// falling back to placeholders field by field.
    pub fn from_snapshot(info: &Value) -> Self {
        let fallback = Self::anonymous();
        let get = |key: &str, default: String| {
            info.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .unwrap_or(default)
        };
        Self {
            name: get("name", fallback.name),
            email: get("email", fallback.email),
            phone: get("phone", fallback.phone),
        }
    }
}

fn contains_any(message: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| message.contains(k))
}

/// Generate the canned reply for a chat message. Rule order matters: the
/// first matching keyword set wins, so "when is the demo" answers with batch
/// timings, not the demo pitch.
pub fn reply(message: &str, profile: &Profile) -> String {
    let message = message.to_lowercase();

    if contains_any(&message, &["course", "training", "learn"]) {
        return "We offer comprehensive SAP training in:\n\n- SAP S/4 HANA\n- SAP FICO\n- SAP ABAP\n- SAP MM\n- SAP SD\n- SAP Fiori\n- SAP HANA\nAnd more!\n\nWhich course interests you?".to_string();
    }

    if contains_any(&message, &["s/4", "s4", "hana"]) {
        return "SAP S/4 HANA is our most trending course!\n\n- Latest SAP Technology\n- Real-time Data Processing\n- Fiori UX Integration\n- Migration Strategies\n- Hands-on Projects\n\nDuration: 60 Days\n\nWould you like to know about fees or schedule a demo?".to_string();
    }

    if contains_any(&message, &["fico", "finance", "accounting"]) {
        return "SAP FICO is perfect for finance professionals!\n\n- Financial Accounting (FI)\n- Controlling (CO)\n- Asset Accounting\n- End-to-End Implementation\n\nDuration: 45 Days\n\nInterested in enrollment or a free demo?".to_string();
    }

    if contains_any(&message, &["fee", "cost", "price", "payment"]) {
        return format!(
            "Our course fees are competitive with flexible payment options:\n\n- Installment Plans Available\n- Early Bird Discounts\n- Group Discounts\n- Corporate Training Packages\n\nFor exact pricing, our team will contact you at:\nEmail: {}\nPhone: {}",
            profile.email, profile.phone
        );
    }

    if contains_any(&message, &["schedule", "timing", "batch", "when"]) {
        return "We offer flexible batch timings:\n\n- Weekday Batches: Mon-Fri\n- Weekend Batches: Sat-Sun\n- Fast Track Available\n\nMorning and Evening slots available!\nWhat timing works best for you?".to_string();
    }

    if contains_any(&message, &["demo", "trial", "free"]) {
        return format!(
            "Great! We offer FREE demo classes!\n\nOur team will reach out to you at:\nEmail: {}\nPhone: {}\n\nYou can also call us directly:\n+91 98765 43210",
            profile.email, profile.phone
        );
    }

    if contains_any(&message, &["job", "placement", "career"]) {
        return "Yes! We provide comprehensive job assistance!\n\n- 95% Placement Rate\n- Resume Building\n- Interview Preparation\n- Job Referrals\n- Mock Interviews\n- Career Guidance\n\nMany students placed in top MNCs!".to_string();
    }

    if contains_any(&message, &["contact", "phone", "email", "call"]) {
        return "Contact us anytime:\n\n+91 98765 43210\n+91 98765 43211\ninfo@shashanksaptraining.com\nHyderabad, Telangana\n\nMon-Sat: 9 AM - 8 PM".to_string();
    }

    if contains_any(&message, &["location", "address", "where"]) {
        return "We're located in Hyderabad, Telangana, India\n\n- Classroom Training Available\n- Online Training Available\n\nWhich mode interests you?".to_string();
    }

    if contains_any(&message, &["hello", "hi", "hey"]) {
        return format!("Hello {}!\nHow can I assist you today?", profile.name);
    }

    if contains_any(&message, &["thank", "thanks"]) {
        return "You're welcome!\nIs there anything else you'd like to know?".to_string();
    }

    format!(
        "Thank you for your message! Our team will contact you soon at {} or {}.\n\nYou can ask about:\n- Course Details\n- Training Schedules\n- Fees & Payment\n- Job Assistance\n- Demo Classes\n\nOr call us at: +91 98765 43210",
        profile.email, profile.phone
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile() -> Profile {
        Profile {
            name: "Rajesh".into(),
            email: "rajesh@example.com".into(),
            phone: "+91 90000 00001".into(),
        }
    }

    #[test]
    fn course_keywords_list_the_catalog() {
        let out = reply("Which courses do you run?", &profile());
        assert!(out.contains("SAP S/4 HANA"));
        assert!(out.contains("SAP FICO"));
    }

    #[test]
    fn fee_reply_interpolates_contact_details() {
        let out = reply("what is the FEE structure", &profile());
        assert!(out.contains("rajesh@example.com"));
        assert!(out.contains("+91 90000 00001"));
    }

    #[test]
    fn first_matching_rule_wins() {
        // "when" (schedule rule) sits before "demo" in the rule order.
        let out = reply("when can I attend a demo?", &profile());
        assert!(out.contains("batch timings"));
        assert!(!out.contains("FREE demo"));
    }

    #[test]
    fn greeting_uses_the_profile_name() {
        let out = reply("hello!", &profile());
        assert!(out.starts_with("Hello Rajesh!"));
    }

    #[test]
    fn unmatched_input_falls_back_with_contact_details() {
        let out = reply("zzz qqq", &profile());
        assert!(out.contains("Thank you for your message!"));
        assert!(out.contains("rajesh@example.com"));
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let out = reply("TRAINING?", &profile());
        assert!(out.contains("comprehensive SAP training"));
        // substring semantics: "hi" inside another word still greets
        let out = reply("something", &profile());
        assert!(out.starts_with("Hello Rajesh!"));
    }

    #[test]
    fn snapshot_profile_falls_back_per_field() {
        let p = Profile::from_snapshot(&json!({"name": "Sneha", "email": ""}));
        assert_eq!(p.name, "Sneha");
        assert_eq!(p.email, "your registered email");
        assert_eq!(p.phone, "your registered phone");
    }
}
