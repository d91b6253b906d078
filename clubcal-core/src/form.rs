//! State of the add/edit event modal.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::{ClubCalError, ClubCalResult};
use crate::event::{Event, EventFields, EventId, parse_event_date};

/// What submitting the form will do.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Creating,
    Editing(EventId),
}

/// Field values as typed so far. The date stays optional until submit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormDraft {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub organized_for: String,
    pub in_charge: String,
    pub details: String,
}

/// Form inputs, named as in the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    OrganizedFor,
    InCharge,
    Date,
    Details,
}

impl FromStr for FormField {
    type Err = ClubCalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(FormField::Title),
            "organizedFor" => Ok(FormField::OrganizedFor),
            "inCharge" => Ok(FormField::InCharge),
            "date" => Ok(FormField::Date),
            "details" => Ok(FormField::Details),
            other => Err(ClubCalError::InvalidEvent(format!("unknown field '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventForm {
    mode: FormMode,
    draft: FormDraft,
    open: bool,
}

impl EventForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    /// "Add" intent without a pre-selected day.
    pub fn open_for_new(&mut self) {
        self.mode = FormMode::Creating;
        self.draft = FormDraft::default();
        self.open = true;
    }

    /// A calendar day was clicked.
    pub fn open_for_date(&mut self, date: NaiveDate) {
        self.open_for_new();
        self.draft.date = Some(date);
    }

    /// An existing event was clicked.
    pub fn open_for_event(&mut self, event: &Event) {
        self.mode = FormMode::Editing(event.id.clone());
        self.draft = FormDraft {
            title: event.fields.title.clone(),
            date: Some(event.fields.date),
            organized_for: event.fields.organized_for.clone(),
            in_charge: event.fields.in_charge.clone(),
            details: event.fields.details.clone(),
        };
        self.open = true;
    }

    pub fn set(&mut self, field: FormField, value: &str) -> ClubCalResult<()> {
        match field {
            FormField::Title => self.draft.title = value.to_string(),
            FormField::OrganizedFor => self.draft.organized_for = value.to_string(),
            FormField::InCharge => self.draft.in_charge = value.to_string(),
            FormField::Details => self.draft.details = value.to_string(),
            FormField::Date if value.trim().is_empty() => self.draft.date = None,
            FormField::Date => {
                let date = parse_event_date(value).ok_or_else(|| {
                    ClubCalError::InvalidEvent(format!("invalid date '{}'", value))
                })?;
                self.draft.date = Some(date);
            }
        }
        Ok(())
    }

    /// Set a field by its input name.
    pub fn set_field(&mut self, name: &str, value: &str) -> ClubCalResult<()> {
        self.set(name.parse()?, value)
    }

    /// Close and forget the draft.
    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    pub fn fields(&self) -> ClubCalResult<EventFields> {
        let date = self
            .draft
            .date
            .ok_or_else(|| ClubCalError::InvalidEvent("an event needs a date".into()))?;

        Ok(EventFields {
            title: self.draft.title.clone(),
            date,
            organized_for: self.draft.organized_for.clone(),
            in_charge: self.draft.in_charge.clone(),
            details: self.draft.details.clone(),
        })
    }

    pub fn heading(&self) -> String {
        match (&self.mode, self.draft.date) {
            (FormMode::Editing(_), _) => "Edit Event".to_string(),
            (FormMode::Creating, Some(date)) => format!("Add Event on {}", date.format("%Y-%m-%d")),
            (FormMode::Creating, None) => "Add Event".to_string(),
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self.mode {
            FormMode::Editing(_) => "Update",
            FormMode::Creating => "Add",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::OwnerId;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_event() -> Event {
        Event {
            id: EventId::from("evt-1"),
            owner: OwnerId::from("u"),
            fields: EventFields {
                title: "Quiz night".to_string(),
                date: ymd(2024, 5, 10),
                organized_for: "Members".to_string(),
                in_charge: "Ravi".to_string(),
                details: "Room 4".to_string(),
            },
        }
    }

    #[test]
    fn test_date_click_opens_create_form() {
        let mut form = EventForm::new();
        assert!(!form.is_open());

        form.open_for_date(ymd(2024, 3, 5));
        assert!(form.is_open());
        assert_eq!(form.mode(), &FormMode::Creating);
        assert_eq!(form.heading(), "Add Event on 2024-03-05");
        assert_eq!(form.submit_label(), "Add");
    }

    #[test]
    fn test_event_click_opens_edit_form() {
        let event = sample_event();
        let mut form = EventForm::new();

        form.open_for_event(&event);
        assert_eq!(form.mode(), &FormMode::Editing(EventId::from("evt-1")));
        assert_eq!(form.heading(), "Edit Event");
        assert_eq!(form.submit_label(), "Update");
        assert_eq!(form.fields().unwrap(), event.fields);
    }

    #[test]
    fn test_date_click_after_edit_starts_clean() {
        let mut form = EventForm::new();
        form.open_for_event(&sample_event());
        form.open_for_date(ymd(2024, 6, 1));

        assert_eq!(form.mode(), &FormMode::Creating);
        assert_eq!(form.draft().title, "");
        assert_eq!(form.draft().date, Some(ymd(2024, 6, 1)));
    }

    #[test]
    fn test_set_field_by_input_name() {
        let mut form = EventForm::new();
        form.open_for_new();

        form.set_field("title", "AGM").unwrap();
        form.set_field("organizedFor", "All").unwrap();
        form.set_field("inCharge", "Board").unwrap();
        form.set_field("details", "Bring ID").unwrap();
        form.set_field("date", "2024-09-01").unwrap();

        let fields = form.fields().unwrap();
        assert_eq!(fields.title, "AGM");
        assert_eq!(fields.organized_for, "All");
        assert_eq!(fields.in_charge, "Board");
        assert_eq!(fields.details, "Bring ID");
        assert_eq!(fields.date, ymd(2024, 9, 1));
    }

    #[test]
    fn test_set_field_rejects_bad_input() {
        let mut form = EventForm::new();
        assert!(matches!(
            form.set_field("venue", "Hall"),
            Err(ClubCalError::InvalidEvent(_))
        ));
        assert!(matches!(
            form.set_field("date", "next tuesday"),
            Err(ClubCalError::InvalidEvent(_))
        ));
    }

    #[test]
    fn test_fields_require_date() {
        let mut form = EventForm::new();
        form.open_for_new();
        form.set_field("title", "Undated").unwrap();
        assert_eq!(form.heading(), "Add Event");
        assert!(matches!(form.fields(), Err(ClubCalError::InvalidEvent(_))));

        form.open_for_date(ymd(2024, 1, 1));
        form.set_field("date", "").unwrap();
        assert!(form.fields().is_err());
    }

    #[test]
    fn test_cancel_closes_and_clears() {
        let mut form = EventForm::new();
        form.open_for_event(&sample_event());
        form.cancel();

        assert!(!form.is_open());
        assert_eq!(form.mode(), &FormMode::Creating);
        assert_eq!(form.draft(), &FormDraft::default());
    }
}
