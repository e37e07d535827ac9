//! Suggest command asking the advisor for candidate free days.

use std::io::Write;

use anyhow::{Context, Result};

use dn_core::{AvailabilityStore, DateKey, SuggestionReview, suggest};
use dn_llm::{Client, FreeDaysRequest};

use crate::Config;

pub async fn run<W: Write>(
    writer: &mut W,
    store: &dyn AvailabilityStore,
    client: &Client,
    config: &Config,
    today: DateKey,
    schedules: &str,
    count: u32,
) -> Result<()> {
    let marked = store.list_unavailable().unwrap_or_else(|err| {
        tracing::warn!(%err, "suggesting without stored dates");
        Vec::new()
    });

    let request = FreeDaysRequest {
        past_availability: suggest::describe_marked(&marked, config.polarity),
        leave_schedules: schedules.to_string(),
        count,
        today: today.to_iso(),
    };
    let answer = client
        .suggest_free_days(&config.model, &request)
        .await
        .context("failed to get suggestions")?;

    let review = suggest::review(
        &answer.suggested_dates,
        answer.reasoning,
        today,
        &marked,
        config.polarity,
    );
    write_review(writer, &review)
}

fn write_review<W: Write>(writer: &mut W, review: &SuggestionReview) -> Result<()> {
    if let Some(reasoning) = &review.reasoning {
        writeln!(writer, "Reasoning: {reasoning}")?;
    }

    if review.is_empty() {
        writeln!(writer, "No new dates were suggested.")?;
    } else {
        writeln!(writer, "Suggested free days:")?;
        for date in &review.dates {
            writeln!(writer, "- {date} ({})", date.long_display())?;
        }
    }

    let ignored = [
        ("Already free", join(&review.already_free)),
        ("Ignored past dates", join(&review.past)),
        ("Ignored invalid dates", review.rejected.join(", ")),
    ];
    for (label, values) in ignored {
        if !values.is_empty() {
            writeln!(writer, "{label}: {values}")?;
        }
    }

    if !review.is_empty() {
        writeln!(writer, "Nothing was saved. Confirm them on the admin page.")?;
    }
    Ok(())
}

fn join(dates: &[DateKey]) -> String {
    dates
        .iter()
        .map(|date| date.to_iso())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::routing::post;
    use axum::{Json, Router};
    use dn_core::{MemoryStore, Polarity};
    use insta::assert_snapshot;
    use serde_json::{Value, json};

    fn key(s: &str) -> DateKey {
        DateKey::parse_iso(s).unwrap()
    }

    async fn spawn_advisor(reply: &'static str, context: &'static str) -> String {
        let router = Router::new().route(
            "/v1/messages",
            post(move |Json(body): Json<Value>| async move {
                let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
                assert!(prompt.contains(context));
                assert!(prompt.contains("Today is 2025-06-10; suggest dates on or after today."));
                Json(json!({"content": [{"type": "text", "text": reply}]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1/messages")
    }

    #[tokio::test]
    async fn suggest_prints_reviewed_dates_without_saving() {
        let endpoint = spawn_advisor(
            r#"{"suggested_free_days":["2025-06-20","2025-06-12","2025-06-01","someday"],"reasoning":"Fridays are quiet."}"#,
            "Current unavailable days: 2025-06-12",
        )
        .await;
        let client = Client::new("test-key").unwrap().with_endpoint(endpoint);
        let store = MemoryStore::with_dates([key("2025-06-12")]);

        let mut output = Vec::new();
        run(
            &mut output,
            &store,
            &client,
            &Config::default(),
            key("2025-06-10"),
            "",
            3,
        )
        .await
        .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Reasoning: Fridays are quiet.
        Suggested free days:
        - 2025-06-12 (Thursday, June 12, 2025)
        Already free: 2025-06-20
        Ignored past dates: 2025-06-01
        Ignored invalid dates: someday
        Nothing was saved. Confirm them on the admin page.
        ");
        assert_eq!(store.list_unavailable().unwrap(), vec![key("2025-06-12")]);
    }

    #[tokio::test]
    async fn suggest_with_free_polarity_offers_unmarked_days() {
        let endpoint = spawn_advisor(
            r#"{"suggested_free_days":["2025-06-20","2025-06-12"]}"#,
            "Current free days: 2025-06-12",
        )
        .await;
        let client = Client::new("test-key").unwrap().with_endpoint(endpoint);
        let store = MemoryStore::with_dates([key("2025-06-12")]);
        let config = Config {
            polarity: Polarity::Free,
            ..Config::default()
        };

        let mut output = Vec::new();
        run(&mut output, &store, &client, &config, key("2025-06-10"), "", 3)
            .await
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Suggested free days:
        - 2025-06-20 (Friday, June 20, 2025)
        Already free: 2025-06-12
        Nothing was saved. Confirm them on the admin page.
        ");
    }

    #[test]
    fn empty_review_says_so() {
        let mut output = Vec::new();
        write_review(&mut output, &SuggestionReview::default()).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "No new dates were suggested.\n"
        );
    }
}
