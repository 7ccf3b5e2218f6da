use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use testpilot_core::{
    build_model, Config, FeatureKey, FlowError, FlowExecutor, FlowResult, ModelError, Panel,
    Provider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Sidebar,
    Form,
}

/// The one flow call the UI is waiting on
pub struct PendingCall {
    pub feature: FeatureKey,
    pub ticket: u64,
    pub task: JoinHandle<Result<FlowResult, FlowError>>,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Feature panels, indexed by FeatureKey::index
    pub active: FeatureKey,
    pub sidebar_state: ListState,
    pub panels: Vec<Panel>,

    // Form state for the active panel
    pub field_idx: usize,
    pub cursor: usize, // char position in the edited field
    pub result_scroll: u16,
    pub result_height: u16,

    pub pending: Option<PendingCall>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Model picker state
    pub show_model_picker: bool,
    pub available_models: Vec<String>,
    pub model_picker_state: ListState,

    // Provider state
    pub config: Config,
    pub current_provider: Provider,
    pub selected_model: String,
    pub executor: Option<FlowExecutor>,
    pub show_provider_picker: bool,
    pub provider_picker_state: ListState,

    // API key input state
    pub show_api_key_input: bool,
    pub api_key_input: String,
    pub api_key_input_cursor: usize,
    pub api_key_target_provider: Option<Provider>,

    // Panel areas for mouse hit-testing (updated during render)
    pub sidebar_area: Option<Rect>,
    pub result_area: Option<Rect>,
}

impl App {
    pub fn new(config: Config, current_provider: Provider, selected_model: String) -> Self {
        let mut sidebar_state = ListState::default();
        sidebar_state.select(Some(0));

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: FocusPane::Sidebar,

            active: FeatureKey::SmartCodeSuggestions,
            sidebar_state,
            panels: FeatureKey::all().into_iter().map(Panel::new).collect(),

            field_idx: 0,
            cursor: 0,
            result_scroll: 0,
            result_height: 0,

            pending: None,

            animation_frame: 0,

            show_model_picker: false,
            available_models: Vec::new(),
            model_picker_state: ListState::default(),

            config,
            current_provider,
            selected_model,
            executor: None,
            show_provider_picker: false,
            provider_picker_state: ListState::default(),

            show_api_key_input: false,
            api_key_input: String::new(),
            api_key_input_cursor: 0,
            api_key_target_provider: None,

            sidebar_area: None,
            result_area: None,
        }
    }

    pub fn panel(&self) -> &Panel {
        &self.panels[self.active.index()]
    }

    pub fn panel_mut(&mut self) -> &mut Panel {
        &mut self.panels[self.active.index()]
    }

    pub fn is_loading(&self) -> bool {
        self.panel().is_submitting()
    }

    // Sidebar navigation
    pub fn sidebar_down(&mut self) {
        let len = FeatureKey::all().len();
        let i = self.sidebar_state.selected().unwrap_or(0);
        self.sidebar_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn sidebar_up(&mut self) {
        let i = self.sidebar_state.selected().unwrap_or(0);
        self.sidebar_state.select(Some(i.saturating_sub(1)));
    }

    /// Open the feature under the sidebar cursor
    pub fn open_selected(&mut self) {
        let i = self.sidebar_state.selected().unwrap_or(0);
        if let Some(&key) = FeatureKey::all().get(i) {
            self.switch_feature(key);
            self.focus = FocusPane::Form;
        }
    }

    /// Make `key` the active panel, discarding any call still in flight
    pub fn switch_feature(&mut self, key: FeatureKey) {
        self.sidebar_state.select(Some(key.index()));
        if key == self.active {
            return;
        }

        if let Some(call) = self.pending.take() {
            if let Some(ticket) = self.panels[call.feature.index()].detach() {
                warn!(
                    feature = call.feature.as_str(),
                    ticket, "discarding in-flight call on panel switch"
                );
            }
            // dropping the handle detaches the task; it runs to completion unobserved
        }

        self.active = key;
        self.input_mode = InputMode::Normal;
        self.field_idx = 0;
        self.cursor = 0;
        self.result_scroll = 0;
    }

    // Form navigation
    pub fn field_down(&mut self) {
        let len = self.panel().feature().inputs.len();
        self.field_idx = (self.field_idx + 1).min(len.saturating_sub(1));
    }

    pub fn field_up(&mut self) {
        self.field_idx = self.field_idx.saturating_sub(1);
    }

    pub fn start_editing(&mut self) {
        let idx = self.field_idx;
        self.cursor = self.panel().inputs().get(idx).map(|v| v.chars().count()).unwrap_or(0);
        self.input_mode = InputMode::Editing;
    }

    pub fn editing_field(&mut self) -> Option<&mut String> {
        let idx = self.field_idx;
        self.panel_mut().input_mut(idx)
    }

    pub fn editing_multiline(&self) -> bool {
        self.panel()
            .feature()
            .inputs
            .get(self.field_idx)
            .map(|i| i.multiline)
            .unwrap_or(false)
    }

    fn ensure_executor(&mut self) -> Result<FlowExecutor, ModelError> {
        if let Some(executor) = &self.executor {
            return Ok(executor.clone());
        }

        let model = build_model(&self.config, self.current_provider, &self.selected_model)?;
        let executor = FlowExecutor::new(model);
        self.executor = Some(executor.clone());
        Ok(executor)
    }

    /// Submit the active panel's form. Does nothing while a call is in flight.
    pub fn submit(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }

        let feature = self.active;
        let Some(submission) = self.panel_mut().begin_submit() else {
            return false;
        };

        self.input_mode = InputMode::Normal;
        self.result_scroll = 0;

        // form errors take precedence over provider setup errors
        if let Err(err) = submission.request.render_prompt() {
            debug!(feature = feature.as_str(), error = %err, "form rejected");
            self.panel_mut().complete(submission.ticket, Err(err.into()));
            return true;
        }

        match self.ensure_executor() {
            Ok(executor) => {
                debug!(feature = feature.as_str(), ticket = submission.ticket, "submitting");
                let request = submission.request;
                let task = tokio::spawn(async move { executor.execute(request).await });
                self.pending = Some(PendingCall {
                    feature,
                    ticket: submission.ticket,
                    task,
                });
            }
            Err(err) => {
                self.panel_mut().complete(submission.ticket, Err(err.into()));
            }
        }
        true
    }

    /// Hand a finished call's outcome to its panel
    pub async fn poll_pending(&mut self) {
        let finished = self
            .pending
            .as_ref()
            .map(|call| call.task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        let Some(call) = self.pending.take() else {
            return;
        };
        let outcome = match call.task.await {
            Ok(outcome) => outcome,
            Err(e) => Err(ModelError::internal(format!("flow task failed: {}", e)).into()),
        };

        if !self.panels[call.feature.index()].complete(call.ticket, outcome) {
            debug!(ticket = call.ticket, "ignoring stale completion");
        }
    }

    /// Tick animation frame and notice timers (called by Tick event)
    pub fn tick(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        for panel in &mut self.panels {
            panel.tick();
        }
    }

    pub fn scroll_result_down(&mut self, lines: u16) {
        self.result_scroll = self.result_scroll.saturating_add(lines);
    }

    pub fn scroll_result_up(&mut self, lines: u16) {
        self.result_scroll = self.result_scroll.saturating_sub(lines);
    }

    // Model picker methods
    pub fn model_picker_nav_down(&mut self) {
        let len = self.available_models.len();
        if len > 0 {
            let i = self.model_picker_state.selected().unwrap_or(0);
            self.model_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        if let Some(i) = self.model_picker_state.selected() {
            if let Some(model) = self.available_models.get(i) {
                self.selected_model = model.clone();
                self.executor = None;
                self.show_model_picker = false;
                if let Err(e) = Config::save_default_model(&self.selected_model) {
                    warn!(error = %e, "could not save model choice");
                }
            }
        }
    }

    // Provider picker methods
    pub fn provider_picker_nav_down(&mut self) {
        let len = Provider::all().len();
        let i = self.provider_picker_state.selected().unwrap_or(0);
        self.provider_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn provider_picker_nav_up(&mut self) {
        let i = self.provider_picker_state.selected().unwrap_or(0);
        self.provider_picker_state.select(Some(i.saturating_sub(1)));
    }

    /// Switch provider, picking `model` for it and persisting the choice
    pub fn use_provider(&mut self, provider: Provider, model: String) {
        self.current_provider = provider;
        self.selected_model = model;
        self.executor = None;
        self.config.provider = Some(provider.as_str().to_string());
        self.config.default_model = Some(self.selected_model.clone());
        if let Err(e) = Config::save_provider(provider, &self.selected_model) {
            warn!(error = %e, "could not save provider choice");
        }
    }

    /// Store an API key typed into the key prompt
    pub fn store_api_key(&mut self, provider: Provider, key: String) {
        let mut stored = Config::load().unwrap_or_else(|_| Config::new());
        match provider {
            Provider::Claude => {
                self.config.claude_api_key = Some(key.clone());
                stored.claude_api_key = Some(key);
            }
            Provider::OpenAI => {
                self.config.openai_api_key = Some(key.clone());
                stored.openai_api_key = Some(key);
            }
            Provider::Ollama => return,
        }
        if let Err(e) = stored.save() {
            warn!(error = %e, "could not save API key");
        }
    }

    /// Returns the source of the API key for a provider, or None if it needs one
    pub fn get_key_source(&self, provider: Provider) -> Option<&'static str> {
        self.config.api_key(provider).map(|(_, source)| source.label())
    }
}
