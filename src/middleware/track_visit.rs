use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{headers::UserAgent, TypedHeader};
use once_cell::sync::Lazy;
use regex::Regex;

static IOS_DEVICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((iPhone|iPad|iPod)[^)]*?OS (\d+)_").unwrap());
static ANDROID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Android (\d+)[.\d]*(?:; ([^;)]+?))?(?: Build/[^;)]*)?(?:;[^)]*)?\)").unwrap()
});
static WINDOWS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Windows NT (\d+\.\d+)").unwrap());
static MAC_OS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Mac OS X (\d+)").unwrap());

fn windows_version(nt: &str) -> &'static str {
    match nt {
        "10.0" => "10",
        "6.3" => "8.1",
        "6.2" => "8",
        "6.1" => "7",
        "6.0" => "Vista",
        "5.1" | "5.2" => "XP",
        _ => "",
    }
}

/// Summarises a User-Agent as `"<Device> (<OS> <major>)"`.
pub fn summarize_user_agent(user_agent: &str) -> String {
    let (device, os, major) = if let Some(caps) = IOS_DEVICE.captures(user_agent) {
        (caps[1].to_string(), "iOS", caps[2].to_string())
    } else if let Some(caps) = ANDROID.captures(user_agent) {
        let device = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|m| !m.is_empty() && *m != "K" && *m != "wv")
            .unwrap_or("Generic Smartphone")
            .to_string();
        (device, "Android", caps[1].to_string())
    } else if let Some(caps) = WINDOWS.captures(user_agent) {
        (
            "Other".to_string(),
            "Windows",
            windows_version(&caps[1]).to_string(),
        )
    } else if let Some(caps) = MAC_OS.captures(user_agent) {
        ("Mac".to_string(), "Mac OS X", caps[1].to_string())
    } else if user_agent.contains("Linux") {
        ("Other".to_string(), "Linux", String::new())
    } else {
        ("Other".to_string(), "Other", String::new())
    };

    if major.is_empty() {
        format!("{} ({})", device, os)
    } else {
        format!("{} ({} {})", device, os, major)
    }
}

/// Records one visit per request before handing it on.
pub async fn track_visit(
    State(state): State<AppState>,
    user_agent: Option<TypedHeader<UserAgent>>,
    request: Request,
    next: Next,
) -> Response {
    let summary = summarize_user_agent(
        user_agent
            .as_ref()
            .map(|TypedHeader(ua)| ua.as_str())
            .unwrap_or_default(),
    );

    if let Err(e) = state.visit_repository.record(&summary).await {
        tracing::warn!("Failed to record visit ({}): {}", summary, e);
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_iphone() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1_2 like Mac OS X) \
                  AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
        assert_eq!(summarize_user_agent(ua), "iPhone (iOS 17)");
    }

    #[test]
    fn test_summarize_windows_desktop() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                  (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
        assert_eq!(summarize_user_agent(ua), "Other (Windows 10)");
    }

    #[test]
    fn test_summarize_android_model() {
        let ua = "Mozilla/5.0 (Linux; Android 13; SM-S918B Build/TP1A.220624.014) \
                  AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
        assert_eq!(summarize_user_agent(ua), "SM-S918B (Android 13)");

        let reduced = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 \
                       (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
        assert_eq!(summarize_user_agent(reduced), "Generic Smartphone (Android 10)");
    }

    #[test]
    fn test_summarize_mac_and_unknown() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15";
        assert_eq!(summarize_user_agent(ua), "Mac (Mac OS X 10)");
        assert_eq!(summarize_user_agent("curl/8.4.0"), "Other (Other)");
        assert_eq!(summarize_user_agent(""), "Other (Other)");
    }
}
