use super::TrackerOperations;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::Dataset;
use crate::sheets::auth::create_and_verify_authenticator;
use crate::sheets::formatting;
use async_trait::async_trait;
use google_drive3::api::{DriveHub, Permission};
use google_sheets4::api::{
    AddSheetRequest, BatchUpdateSpreadsheetRequest, ClearValuesRequest, GridProperties, Request,
    Sheet, SheetProperties, Sheets, Spreadsheet, SpreadsheetProperties, ValueRange,
};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use tracing::{debug, info, instrument, warn};

// Scopes requested for the service account session.
pub(crate) const AUTH_SCOPES: [&str; 4] = [
    "https://spreadsheets.google.com/feeds",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive",
];

// New worksheets start with a fixed grid.
const WORKSHEET_ROWS: i32 = 50;
const WORKSHEET_COLS: i32 = 20;

pub struct SheetSync {
    sheets: Sheets<HttpsConnector<HttpConnector>>,
    drive: DriveHub<HttpsConnector<HttpConnector>>,
    document_name: String,
    collaborators: Vec<String>,
}

impl SheetSync {
    /// Create a new SheetSync for the named tracker document with
    /// authenticated access
    #[instrument(name = "Authenticating to Google Sheets", skip_all)]
    pub async fn connect(document_name: impl Into<String>, config: &Config) -> Result<Self> {
        let auth = create_and_verify_authenticator(&config.credentials_file).await?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(connector);

        let sheets = Sheets::new(client.clone(), auth.clone());
        let drive = DriveHub::new(client, auth);

        Ok(Self {
            sheets,
            drive,
            document_name: document_name.into(),
            collaborators: config.users_email.clone(),
        })
    }

    #[instrument(name = "Finding tracker document", skip(self))]
    async fn find_document(&self) -> Result<Option<String>> {
        let query = format!(
            "name='{}' and mimeType='application/vnd.google-apps.spreadsheet' and trashed=false",
            self.document_name
        );

        let (_, file_list) = self
            .drive
            .files()
            .list()
            .q(&query)
            .spaces("drive")
            .page_size(1)
            .add_scopes(AUTH_SCOPES)
            .doit()
            .await
            .map_err(|e| AppError::Drive(format!("Failed to search for document: {}", e)))?;

        let document_id = file_list
            .files
            .and_then(|files| files.into_iter().next())
            .map(|file| file.id.unwrap_or_default());

        Ok(document_id)
    }

    #[instrument(name = "Creating tracker document", skip(self))]
    async fn create_document(&self) -> Result<String> {
        let spreadsheet = Spreadsheet {
            properties: Some(SpreadsheetProperties {
                title: Some(self.document_name.clone()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let (_, result) = self
            .sheets
            .spreadsheets()
            .create(spreadsheet)
            .add_scopes(AUTH_SCOPES)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to create document: {}", e)))?;

        result
            .spreadsheet_id
            .ok_or_else(|| AppError::Sheets("Created document has empty ID".to_string()))
    }

    async fn open_document(&self) -> Result<String> {
        self.find_document().await?.ok_or_else(|| {
            AppError::Drive(format!("Document '{}' not found", self.document_name))
        })
    }

    async fn get_spreadsheet(&self, document_id: &str) -> Result<Spreadsheet> {
        let (_, spreadsheet) = self
            .sheets
            .spreadsheets()
            .get(document_id)
            .include_grid_data(false)
            .add_scopes(AUTH_SCOPES)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to get document: {}", e)))?;

        Ok(spreadsheet)
    }

    /// Invite every configured collaborator as a writer, without notification
    /// emails. A quota error stops the remaining invitations for this call.
    #[instrument(name = "Sharing tracker document", skip_all)]
    async fn share_with_collaborators(&self, document_id: &str) -> Result<()> {
        for email in &self.collaborators {
            let permission = Permission {
                type_: Some("user".to_string()),
                role: Some("writer".to_string()),
                email_address: Some(email.clone()),
                ..Default::default()
            };

            let invited = self
                .drive
                .permissions()
                .create(permission, document_id)
                .send_notification_email(false)
                .add_scopes(AUTH_SCOPES)
                .doit()
                .await;

            match invited {
                Ok(_) => info!(email = %email, "Shared document"),
                Err(e) if is_quota_error(&e) => {
                    warn!(
                        email = %email,
                        "Sharing quota exceeded, skipping remaining invitations"
                    );
                    break;
                }
                Err(e) => {
                    return Err(AppError::Drive(format!(
                        "Failed to share document with {}: {}",
                        email, e
                    )));
                }
            }
        }

        Ok(())
    }

    #[instrument(name = "Creating worksheet", skip(self, document_id))]
    async fn create_worksheet(&self, document_id: &str, title: &str) -> Result<Sheet> {
        let request = Request {
            add_sheet: Some(AddSheetRequest {
                properties: Some(SheetProperties {
                    title: Some(title.to_string()),
                    sheet_type: Some("GRID".to_string()),
                    grid_properties: Some(GridProperties {
                        row_count: Some(WORKSHEET_ROWS),
                        column_count: Some(WORKSHEET_COLS),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        };

        let batch_update = BatchUpdateSpreadsheetRequest {
            requests: Some(vec![request]),
            include_spreadsheet_in_response: Some(true),
            response_include_grid_data: Some(false),
            ..Default::default()
        };

        let (_, response) = self
            .sheets
            .spreadsheets()
            .batch_update(batch_update, document_id)
            .add_scopes(AUTH_SCOPES)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to create worksheet: {}", e)))?;

        let sheet_properties = response
            .replies
            .and_then(|replies| replies.into_iter().next())
            .and_then(|reply| reply.add_sheet)
            .and_then(|add_sheet| add_sheet.properties)
            .ok_or_else(|| {
                AppError::Sheets("Failed to get sheet properties from create response".to_string())
            })?;

        Ok(Sheet {
            properties: Some(sheet_properties),
            ..Default::default()
        })
    }

    #[instrument(name = "Applying status formatting", skip_all)]
    async fn apply_formatting(&self, document_id: &str, sheet: &Sheet) -> Result<()> {
        let sheet_id = sheet
            .properties
            .as_ref()
            .and_then(|p| p.sheet_id)
            .ok_or_else(|| AppError::Sheets("Sheet ID not found".to_string()))?;

        let mut requests = vec![
            formatting::bold_header_rule(sheet_id),
            formatting::freeze_header_rule(sheet_id),
        ];
        requests.extend(formatting::status_color_rules(sheet_id, sheet));

        let batch_update = BatchUpdateSpreadsheetRequest {
            requests: Some(requests),
            ..Default::default()
        };

        self.sheets
            .spreadsheets()
            .batch_update(batch_update, document_id)
            .add_scopes(AUTH_SCOPES)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to apply formatting: {}", e)))?;

        Ok(())
    }

    #[instrument(name = "Writing dataset", skip(self, document_id, dataset))]
    async fn write_dataset(&self, document_id: &str, title: &str, dataset: &Dataset) -> Result<()> {
        // Clear the entire worksheet first
        self.sheets
            .spreadsheets()
            .values_clear(ClearValuesRequest::default(), document_id, &quote_title(title))
            .add_scopes(AUTH_SCOPES)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to clear worksheet: {}", e)))?;

        let data_range = format!("{}!A1", quote_title(title));
        let value_range = ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range: Some(data_range.clone()),
            values: Some(dataset.to_sheet_rows()),
        };

        self.sheets
            .spreadsheets()
            .values_update(value_range, document_id, &data_range)
            .value_input_option("RAW")
            .add_scopes(AUTH_SCOPES)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to write dataset: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl TrackerOperations for SheetSync {
    #[instrument(name = "Creating tracker sheet", skip_all)]
    async fn create_tracker_sheet(&self, dataset: &Dataset) -> Result<()> {
        let document_id = match self.find_document().await? {
            Some(id) => id,
            None => {
                info!(name = %self.document_name, "Creating new tracker document");
                self.create_document().await?
            }
        };

        self.share_with_collaborators(&document_id).await?;

        let spreadsheet = self.get_spreadsheet(&document_id).await?;
        let first_sheet = sheet_at(&spreadsheet, 0)
            .ok_or_else(|| AppError::Sheets("Document has no worksheets".to_string()))?;

        self.apply_formatting(&document_id, first_sheet).await?;
        self.write_dataset(&document_id, sheet_title(first_sheet)?, dataset)
            .await
    }

    #[instrument(name = "Adding worksheet", skip(self, dataset))]
    async fn add_worksheet(
        &self,
        title: &str,
        dataset: &Dataset,
        fallback_index: usize,
    ) -> Result<()> {
        let document_id = self.open_document().await?;
        let spreadsheet = self.get_spreadsheet(&document_id).await?;

        // A taken title falls back to the positional lookup
        let sheet = match sheet_with_title(&spreadsheet, title) {
            Some(_) => {
                debug!(title, fallback_index, "Worksheet exists, using fallback");
                sheet_at(&spreadsheet, fallback_index)
                    .ok_or_else(|| {
                        AppError::Sheets(format!("No worksheet at index {}", fallback_index))
                    })?
                    .clone()
            }
            None => self.create_worksheet(&document_id, title).await?,
        };

        self.apply_formatting(&document_id, &sheet).await?;
        self.write_dataset(&document_id, sheet_title(&sheet)?, dataset)
            .await
    }

    #[instrument(name = "Updating worksheet", skip(self, dataset))]
    async fn update_worksheet(&self, title: &str, dataset: &Dataset) -> Result<()> {
        let document_id = self.open_document().await?;
        let spreadsheet = self.get_spreadsheet(&document_id).await?;

        let sheet = sheet_with_title(&spreadsheet, title)
            .ok_or_else(|| AppError::Sheets(format!("Worksheet '{}' not found", title)))?;

        self.write_dataset(&document_id, sheet_title(sheet)?, dataset)
            .await
    }
}

/// Quote a worksheet title for use in an A1 range.
fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn sheet_title(sheet: &Sheet) -> Result<&str> {
    sheet
        .properties
        .as_ref()
        .and_then(|p| p.title.as_deref())
        .ok_or_else(|| AppError::Sheets("Sheet title not found".to_string()))
}

fn sheet_with_title<'a>(spreadsheet: &'a Spreadsheet, title: &str) -> Option<&'a Sheet> {
    spreadsheet
        .sheets
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|sheet| {
            sheet
                .properties
                .as_ref()
                .map(|props| props.title.as_deref() == Some(title))
                .unwrap_or(false)
        })
}

fn sheet_at(spreadsheet: &Spreadsheet, index: usize) -> Option<&Sheet> {
    spreadsheet.sheets.as_deref().unwrap_or_default().get(index)
}

fn is_quota_error(err: &google_drive3::Error) -> bool {
    match err {
        google_drive3::Error::BadRequest(value) => {
            let body = value.to_string();
            body.contains("rateLimitExceeded")
                || body.contains("sharingRateLimitExceeded")
                || body.contains("userRateLimitExceeded")
                || body.contains("quotaExceeded")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_sheet(title: &str, sheet_id: i32) -> Sheet {
        Sheet {
            properties: Some(SheetProperties {
                title: Some(title.to_string()),
                sheet_id: Some(sheet_id),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn mock_spreadsheet(titles: &[&str]) -> Spreadsheet {
        Spreadsheet {
            sheets: Some(
                titles
                    .iter()
                    .enumerate()
                    .map(|(idx, title)| mock_sheet(title, idx as i32))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn test_quote_title() {
        assert_eq!(quote_title("Week1"), "'Week1'");
        assert_eq!(quote_title("Bob's Week"), "'Bob''s Week'");
    }

    #[test]
    fn test_sheet_with_title() {
        let spreadsheet = mock_spreadsheet(&["Overview", "Week1"]);

        let sheet = sheet_with_title(&spreadsheet, "Week1").unwrap();
        assert_eq!(sheet_title(sheet).unwrap(), "Week1");
        assert!(sheet_with_title(&spreadsheet, "Week2").is_none());
    }

    #[test]
    fn test_sheet_at() {
        let spreadsheet = mock_spreadsheet(&["Overview", "Week1", "Week2"]);

        let sheet = sheet_at(&spreadsheet, 2).unwrap();
        assert_eq!(sheet_title(sheet).unwrap(), "Week2");
        assert!(sheet_at(&spreadsheet, 3).is_none());
    }

    #[test]
    fn test_is_quota_error() {
        let body = serde_json::json!({
            "error": {
                "code": 403,
                "errors": [{"domain": "usageLimits", "reason": "sharingRateLimitExceeded"}]
            }
        });
        assert!(is_quota_error(&google_drive3::Error::BadRequest(body)));

        let body = serde_json::json!({
            "error": {"code": 404, "errors": [{"reason": "notFound"}]}
        });
        assert!(!is_quota_error(&google_drive3::Error::BadRequest(body)));
        assert!(!is_quota_error(&google_drive3::Error::MissingAPIKey));
    }
}
