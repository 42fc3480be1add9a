//! Main TUI application state and event handling

use super::views;
use super::{EventLoop, TuiEvent};
use crate::analysis::{load_sales_csv, run_forecast, summarize};
use crate::auth;
use crate::config::Settings;
use crate::error::SalesSightError;
use crate::feedback::{FeedbackForm, Notice, NoticeKind, SALES_FORECASTING_FEATURE};
use crate::session::Session;
use crate::storage::StorageBackend;
use crate::types::{Forecast, ForecastHorizon, SalesRecord, SalesSummary};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::path::PathBuf;
use std::sync::Arc;

/// Application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppState {
    /// Running normally
    Running,
    /// Quit requested
    Quitting,
}

/// Pages of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Login,
    Register,
    Upload,
    Dashboard,
    Forecasting,
    Settings,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "SalesSight",
            Page::Login => "Login",
            Page::Register => "Register New Account",
            Page::Upload => "Upload Sales Data",
            Page::Dashboard => "Dashboard",
            Page::Forecasting => "Sales Forecasting",
            Page::Settings => "Settings",
        }
    }
}

/// Which credential field has input focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CredentialField {
    Username,
    Password,
}

/// Main TUI application
pub struct App {
    store: Arc<dyn StorageBackend>,
    pub(crate) settings: Settings,
    pub(crate) session: Session,
    pub(crate) page: Page,
    state: AppState,
    event_loop: EventLoop,

    // Login / Register inputs
    pub(crate) username_input: String,
    pub(crate) password_input: String,
    pub(crate) credential_focus: CredentialField,

    // Upload page
    pub(crate) path_input: String,
    pub(crate) records: Option<Vec<SalesRecord>>,
    pub(crate) summary: Option<SalesSummary>,

    // Forecasting page
    pub(crate) horizon: ForecastHorizon,
    pub(crate) product_idx: usize,
    pub(crate) forecast: Option<Forecast>,
    pub(crate) form: FeedbackForm,

    /// Page-level status message (login errors, upload results, ...)
    pub(crate) status: Option<Notice>,
}

impl App {
    /// Create the application over an initialized store
    pub fn new(store: Arc<dyn StorageBackend>, settings: Settings) -> Self {
        Self {
            store,
            settings,
            session: Session::new(),
            page: Page::Home,
            state: AppState::Running,
            event_loop: EventLoop::default(),
            username_input: String::new(),
            password_input: String::new(),
            credential_focus: CredentialField::Username,
            path_input: String::new(),
            records: None,
            summary: None,
            horizon: ForecastHorizon::default(),
            product_idx: 0,
            forecast: None,
            form: FeedbackForm::new(SALES_FORECASTING_FEATURE),
            status: None,
        }
    }

    /// Run the application until quit
    pub async fn run(mut self) -> Result<()> {
        let mut terminal = ratatui::init();
        let result = self.main_loop(&mut terminal).await;
        ratatui::restore();
        result
    }

    async fn main_loop(&mut self, terminal: &mut ratatui::DefaultTerminal) -> Result<()> {
        loop {
            terminal.draw(|frame| views::render(self, frame))?;

            if let Some(event) = self.event_loop.poll_event()? {
                self.handle_event(event).await?;
            }

            if self.state == AppState::Quitting {
                break;
            }

            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        }

        Ok(())
    }

    /// Handle TUI event
    async fn handle_event(&mut self, event: TuiEvent) -> Result<()> {
        match event {
            TuiEvent::Quit => self.state = AppState::Quitting,
            TuiEvent::Key(key) => self.handle_key(key).await?,
            TuiEvent::Resize(_, _) | TuiEvent::Tick => {}
        }
        Ok(())
    }

    async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.page {
            Page::Home => self.handle_home_key(key),
            Page::Login => self.handle_credentials_key(key, true).await,
            Page::Register => self.handle_credentials_key(key, false).await,
            Page::Upload => self.handle_upload_key(key),
            Page::Dashboard | Page::Settings => self.handle_static_key(key),
            Page::Forecasting => self.handle_forecasting_key(key).await,
        }
        Ok(())
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.state = AppState::Quitting,
            KeyCode::Char('l') if !self.session.is_logged_in() => self.goto(Page::Login),
            KeyCode::Char('r') if !self.session.is_logged_in() => self.goto(Page::Register),
            KeyCode::Char('u') if self.session.is_logged_in() => self.goto(Page::Upload),
            KeyCode::Char('d') if self.session.is_logged_in() => self.goto(Page::Dashboard),
            KeyCode::Char('f') if self.session.is_logged_in() => self.goto(Page::Forecasting),
            KeyCode::Char('s') if self.session.is_logged_in() => self.goto(Page::Settings),
            KeyCode::Char('o') if self.session.is_logged_in() => self.log_out(),
            _ => {}
        }
    }

    async fn handle_credentials_key(&mut self, key: KeyEvent, login: bool) {
        match key.code {
            KeyCode::Esc => self.goto(Page::Home),
            KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
                self.credential_focus = match self.credential_focus {
                    CredentialField::Username => CredentialField::Password,
                    CredentialField::Password => CredentialField::Username,
                };
            }
            KeyCode::Backspace => {
                match self.credential_focus {
                    CredentialField::Username => self.username_input.pop(),
                    CredentialField::Password => self.password_input.pop(),
                };
            }
            KeyCode::Char(c) => match self.credential_focus {
                CredentialField::Username => self.username_input.push(c),
                CredentialField::Password => self.password_input.push(c),
            },
            KeyCode::Enter => self.submit_credentials(login).await,
            _ => {}
        }
    }

    async fn submit_credentials(&mut self, login: bool) {
        let username = self.username_input.trim().to_string();
        let password = self.password_input.clone();
        let store = self.store.clone();

        if login {
            match auth::log_in(store.as_ref(), &mut self.session, &username, &password).await {
                Ok(Some(user)) => {
                    self.username_input.clear();
                    self.password_input.clear();
                    self.set_status(
                        NoticeKind::Success,
                        format!("Welcome, {}!", user.username),
                    );
                    self.page = Page::Upload;
                }
                Ok(None) => {
                    self.set_status(
                        NoticeKind::Warning,
                        "Invalid username or password.".to_string(),
                    );
                }
                Err(e) => self.set_status(NoticeKind::Error, e.to_string()),
            }
        } else {
            match auth::register(store.as_ref(), &username, &password).await {
                Ok(_) => {
                    self.password_input.clear();
                    self.set_status(
                        NoticeKind::Success,
                        "Registration successful! Please log in.".to_string(),
                    );
                    self.page = Page::Login;
                }
                Err(SalesSightError::AlreadyExists(name)) => {
                    self.set_status(
                        NoticeKind::Warning,
                        format!("Username '{}' already exists.", name),
                    );
                }
                Err(SalesSightError::Validation(msg)) => {
                    self.set_status(NoticeKind::Warning, msg);
                }
                Err(e) => self.set_status(NoticeKind::Error, e.to_string()),
            }
        }
    }

    fn handle_upload_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.goto(Page::Home),
            KeyCode::Backspace => {
                self.path_input.pop();
            }
            KeyCode::Char(c) => self.path_input.push(c),
            KeyCode::Enter => self.load_data(),
            _ => {}
        }
    }

    fn load_data(&mut self) {
        let path = PathBuf::from(self.path_input.trim());
        match load_sales_csv(&path) {
            Ok(records) => {
                self.set_status(
                    NoticeKind::Success,
                    format!("Loaded {} row(s) from {}", records.len(), path.display()),
                );
                self.summary = Some(summarize(&records));
                self.records = Some(records);
                self.session.set_data_path(&path);
                // Fresh data invalidates the previous analysis and its form
                self.forecast = None;
                self.product_idx = 0;
                self.form = FeedbackForm::new(SALES_FORECASTING_FEATURE);
            }
            Err(e) => self.set_status(NoticeKind::Error, e.to_string()),
        }
    }

    fn handle_static_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
            self.goto(Page::Home);
        }
    }

    async fn handle_forecasting_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.goto(Page::Home),
            // Re-running the forecast starts a new analysis instance
            KeyCode::F(5) => self.run_analysis(),
            KeyCode::Enter => {
                if self.form.is_open() {
                    self.submit_feedback().await;
                } else {
                    self.run_analysis();
                }
            }
            KeyCode::Left => self.form.rating_down(),
            KeyCode::Right => self.form.rating_up(),
            KeyCode::Up if !self.form.is_open() => self.cycle_horizon(-1),
            KeyCode::Down if !self.form.is_open() => self.cycle_horizon(1),
            KeyCode::Tab if !self.form.is_open() => self.cycle_product(),
            KeyCode::Backspace => self.form.pop_comment_char(),
            KeyCode::Char(c) => self.form.push_comment_char(c),
            _ => {}
        }
    }

    fn cycle_horizon(&mut self, step: isize) {
        let all = ForecastHorizon::ALL;
        let current = all.iter().position(|h| *h == self.horizon).unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(all.len() as isize) as usize;
        self.horizon = all[next];
    }

    fn cycle_product(&mut self) {
        let count = self.product_names().len() + 1;
        self.product_idx = (self.product_idx + 1) % count;
    }

    /// Distinct product names in the loaded data, sorted
    pub(crate) fn product_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .iter()
            .flatten()
            .filter_map(|r| r.product.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// The product filter currently selected, `None` meaning all products
    pub(crate) fn selected_product(&self) -> Option<String> {
        if self.product_idx == 0 {
            None
        } else {
            self.product_names().get(self.product_idx - 1).cloned()
        }
    }

    /// Run the forecast; success unlocks a fresh feedback cycle
    fn run_analysis(&mut self) {
        let product = self.selected_product();
        let outcome = self.records.as_ref().map(|records| {
            run_forecast(
                records,
                self.horizon,
                product.as_deref(),
                &self.settings.forecast,
            )
        });

        match outcome {
            None => {
                self.set_status(
                    NoticeKind::Warning,
                    "Please upload a sales CSV file first.".to_string(),
                );
            }
            Some(Ok(forecast)) => {
                self.forecast = Some(forecast);
                self.session.begin_analysis();
                self.form.unlock();
                self.status = None;
            }
            Some(Err(e)) => {
                self.forecast = None;
                self.set_status(NoticeKind::Error, e.to_string());
            }
        }
    }

    async fn submit_feedback(&mut self) {
        let store = self.store.clone();
        self.form.submit(&mut self.session, store.as_ref()).await;
    }

    fn log_out(&mut self) {
        auth::log_out(&mut self.session);
        self.records = None;
        self.summary = None;
        self.forecast = None;
        self.form = FeedbackForm::new(SALES_FORECASTING_FEATURE);
        self.set_status(NoticeKind::Success, "Logged out.".to_string());
    }

    fn goto(&mut self, page: Page) {
        self.page = page;
        self.status = None;
        if matches!(page, Page::Login | Page::Register) {
            self.credential_focus = CredentialField::Username;
            self.password_input.clear();
        }
    }

    fn set_status(&mut self, kind: NoticeKind, text: String) {
        self.status = Some(Notice { kind, text });
    }
}
