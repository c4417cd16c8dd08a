//! Conversions between stored documents and domain models.

use anyhow::{anyhow, Result};
use shared::{HolidayDocument, SettingsDocument, VacationRequestDocument};

use crate::domain::models::{
    format_date, parse_date, Holiday, NewVacationRequest, Settings, SettingsPatch, VacationRequest,
};

pub struct RequestMapper;

impl RequestMapper {
    pub fn to_document(request: &NewVacationRequest) -> VacationRequestDocument {
        VacationRequestDocument {
            start_date: format_date(request.start_date),
            end_date: format_date(request.end_date),
            days: request.days,
            status: request.status,
            requested_on: format_date(request.requested_on),
        }
    }

    pub fn to_domain(id: String, document: VacationRequestDocument) -> Result<VacationRequest> {
        let start_date = parse_stored_date(&document.start_date, "startDate")?;
        let end_date = parse_stored_date(&document.end_date, "endDate")?;
        let requested_on = parse_stored_date(&document.requested_on, "requestedOn")?;

        Ok(VacationRequest {
            id,
            start_date,
            end_date,
            days: document.days,
            status: document.status,
            requested_on,
        })
    }
}

pub struct HolidayMapper;

impl HolidayMapper {
    pub fn to_document(holiday: &Holiday) -> HolidayDocument {
        HolidayDocument {
            name: holiday.name.clone(),
            date: format_date(holiday.date),
        }
    }

    pub fn to_domain(document: HolidayDocument) -> Result<Holiday> {
        let date = parse_stored_date(&document.date, "date")?;
        Ok(Holiday::new(document.name, date))
    }
}

pub struct SettingsMapper;

impl SettingsMapper {
    /// `None` when the document has no allotment
    pub fn to_domain(document: &SettingsDocument) -> Option<Settings> {
        document
            .available_days
            .map(|available_days| Settings { available_days })
    }

    /// Apply a patch to a stored document, leaving unset fields untouched
    pub fn merge(document: &mut SettingsDocument, patch: &SettingsPatch) {
        if let Some(days) = patch.available_days {
            document.available_days = Some(days);
        }
    }
}

fn parse_stored_date(value: &str, field: &str) -> Result<chrono::NaiveDate> {
    parse_date(value).ok_or_else(|| anyhow!("invalid {} '{}'", field, value))
}
