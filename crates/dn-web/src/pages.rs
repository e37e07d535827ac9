//! Server-rendered pages: the public status view and the admin view.

use std::collections::BTreeSet;

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::Html,
    routing::{get, post},
};
use chrono::Local;
use serde::Deserialize;

use dn_core::{
    DateKey, Polarity, date::parse_many, format_remaining, remaining_secs,
    suggest::{self, SuggestionReview},
};

use crate::calendar::{MonthGrid, month_grids};
use crate::error::AppError;
use crate::state::AppState;

/// Months shown in the admin date picker.
const ADMIN_MONTHS: usize = 3;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(status_page))
        .route("/admin", get(admin_page))
        .route("/admin/availability", post(save_availability))
        .route("/admin/suggestions", post(request_suggestions))
        .route("/admin/suggestions/apply", post(apply_suggestions))
}

#[derive(Template)]
#[template(path = "status.html")]
struct StatusTemplate {
    is_available: bool,
    today: String,
    countdown: Option<String>,
    countdown_target: Option<String>,
    upcoming_label: &'static str,
    upcoming: Vec<String>,
    warning: Option<String>,
    checked_at: String,
}

/// GET / - Public availability status
async fn status_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let report = state.status().await?;
    let status = &report.status;

    let target = status.countdown_target();
    let countdown = target.and_then(|target| {
        let remaining = remaining_secs(&**state.clock(), target);
        (remaining > 0).then(|| format_remaining(remaining.unsigned_abs()))
    });

    let page = StatusTemplate {
        is_available: status.is_available_today,
        today: status.today.long_display(),
        countdown,
        countdown_target: target.map(DateKey::long_display),
        upcoming_label: upcoming_label(state.resolver().polarity()),
        upcoming: status.upcoming.iter().map(|d| d.long_display()).collect(),
        warning: report.warning.clone(),
        checked_at: Local::now().format("%H:%M:%S").to_string(),
    };
    Ok(Html(page.render()?))
}

const fn upcoming_label(polarity: Polarity) -> &'static str {
    match polarity {
        Polarity::Unavailable => "Upcoming unavailable days",
        Polarity::Free => "Upcoming free days",
    }
}

/// Feedback shown at the top of the admin page.
struct Notice {
    text: String,
    is_error: bool,
}

impl Notice {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

struct SuggestedDate {
    iso: String,
    label: String,
}

#[derive(Template)]
#[template(path = "admin.html")]
struct AdminTemplate {
    notice: Option<Notice>,
    warning: Option<String>,
    marked_kind: &'static str,
    months: Vec<MonthGrid>,
    hidden_dates: Vec<String>,
    advisor_enabled: bool,
    schedules: String,
    review: Option<ReviewView>,
}

struct ReviewView {
    reasoning: Option<String>,
    dates: Vec<SuggestedDate>,
    already_free: Vec<String>,
    past: Vec<String>,
    rejected: Vec<String>,
}

impl From<SuggestionReview> for ReviewView {
    fn from(review: SuggestionReview) -> Self {
        Self {
            reasoning: review.reasoning,
            dates: review
                .dates
                .iter()
                .map(|date| SuggestedDate {
                    iso: date.to_iso(),
                    label: date.long_display(),
                })
                .collect(),
            already_free: review.already_free.iter().map(|d| d.to_iso()).collect(),
            past: review.past.iter().map(|d| d.to_iso()).collect(),
            rejected: review.rejected,
        }
    }
}

/// Extra content for an admin page render.
#[derive(Default)]
struct AdminExtras {
    notice: Option<Notice>,
    schedules: String,
    review: Option<ReviewView>,
}

async fn render_admin(state: &AppState, extras: AdminExtras) -> Result<Html<String>, AppError> {
    let (marked, warning) = match state.with_store(|store| store.list_unavailable()).await? {
        Ok(dates) => (dates, None),
        Err(err) => {
            tracing::warn!(%err, "failed to load dates for admin page");
            (
                Vec::new(),
                Some(format!(
                    "Could not fetch availability ({err}). Saving will replace the stored set."
                )),
            )
        }
    };

    let marked: BTreeSet<DateKey> = marked.into_iter().collect();
    let (months, outside) = month_grids(state.clock().today(), &marked, ADMIN_MONTHS);

    let page = AdminTemplate {
        notice: extras.notice,
        warning,
        marked_kind: state.resolver().polarity().as_str(),
        months,
        hidden_dates: outside.iter().map(|d| d.to_iso()).collect(),
        advisor_enabled: state.advisor().is_some(),
        schedules: extras.schedules,
        review: extras.review,
    };
    Ok(Html(page.render()?))
}

/// GET /admin - Calendar editor and suggestion helper
async fn admin_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render_admin(&state, AdminExtras::default()).await
}

/// Collects every `dates` value from a submitted form.
fn submitted_dates(fields: Vec<(String, String)>) -> (Vec<DateKey>, Vec<String>) {
    parse_many(
        fields
            .into_iter()
            .filter(|(name, _)| name == "dates")
            .map(|(_, value)| value),
    )
}

fn rejected_note(rejected: &[String]) -> String {
    if rejected.is_empty() {
        String::new()
    } else {
        format!(" Skipped invalid dates: {}.", rejected.join(", "))
    }
}

/// POST /admin/availability - Replace the whole date set
async fn save_availability(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let (dates, rejected) = submitted_dates(fields);
    let count = dates.len();
    let result = state.with_store(move |store| store.replace_all(&dates)).await?;

    let notice = match result {
        Ok(()) => {
            tracing::info!(count, "availability saved");
            Notice::ok(format!(
                "Availability updated successfully!{}",
                rejected_note(&rejected)
            ))
        }
        Err(err) => {
            tracing::error!(%err, "failed to save availability");
            Notice::error(format!("Failed to save availability: {err}"))
        }
    };

    render_admin(
        &state,
        AdminExtras {
            notice: Some(notice),
            ..AdminExtras::default()
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
struct SuggestForm {
    #[serde(default)]
    schedules: String,
}

/// POST /admin/suggestions - Ask the advisor for candidate free days
async fn request_suggestions(
    State(state): State<AppState>,
    Form(form): Form<SuggestForm>,
) -> Result<Html<String>, AppError> {
    let Some(advisor) = state.advisor().cloned() else {
        return render_admin(
            &state,
            AdminExtras {
                notice: Some(Notice::error(
                    "Suggestions are disabled: no API key is configured.",
                )),
                schedules: form.schedules,
                review: None,
            },
        )
        .await;
    };

    let marked = match state.with_store(|store| store.list_unavailable()).await? {
        Ok(dates) => dates,
        Err(err) => {
            tracing::warn!(%err, "suggesting without stored dates");
            Vec::new()
        }
    };

    let polarity = state.resolver().polarity();
    let today = state.clock().today();
    let request = dn_llm::FreeDaysRequest {
        past_availability: suggest::describe_marked(&marked, polarity),
        leave_schedules: form.schedules.clone(),
        count: advisor.count,
        today: today.to_iso(),
    };

    let extras = match advisor.client.suggest_free_days(&advisor.model, &request).await {
        Ok(answer) => {
            let review = suggest::review(
                &answer.suggested_dates,
                answer.reasoning,
                today,
                &marked,
                polarity,
            );
            tracing::info!(
                suggested = review.dates.len(),
                rejected = review.rejected.len(),
                "advisor returned suggestions"
            );
            AdminExtras {
                notice: None,
                schedules: form.schedules,
                review: Some(review.into()),
            }
        }
        Err(err) => {
            tracing::error!(%err, "advisor request failed");
            AdminExtras {
                notice: Some(Notice::error(format!("Failed to get suggestions: {err}"))),
                schedules: form.schedules,
                review: None,
            }
        }
    };

    render_admin(&state, extras).await
}

/// POST /admin/suggestions/apply - Make admin-confirmed suggestions free days
async fn apply_suggestions(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let (dates, rejected) = submitted_dates(fields);
    let polarity = state.resolver().polarity();
    let result = state
        .with_store(move |store| suggest::apply_free_days(store, polarity, &dates))
        .await?;

    let notice = match result {
        Ok(changed) => {
            tracing::info!(changed, %polarity, "suggested dates applied");
            Notice::ok(format!(
                "Applied {changed} suggested free day(s).{}",
                rejected_note(&rejected)
            ))
        }
        Err(err) => {
            tracing::error!(%err, "failed to apply suggestions");
            Notice::error(format!("Failed to save availability: {err}"))
        }
    };

    render_admin(
        &state,
        AdminExtras {
            notice: Some(notice),
            ..AdminExtras::default()
        },
    )
    .await
}
