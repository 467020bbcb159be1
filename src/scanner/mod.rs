//! Scan scheduling and reconciliation with a mutating page
//!
//! ```text
//! Disabled --enabled + attribute--> (scan) --> Idle
//! Idle --qualifying mutation--> PendingRescan (debounce armed)
//! PendingRescan --debounce fires--> Scanning --> Idle
//! Scanning --mutation--> follow-up requested --> PendingRescan after the scan
//! any --disabled or attribute cleared--> Disabled
//! ```
//!
//! The scanner is single threaded and never sleeps: hosts call [`Scanner::poll`]
//! with the current time and use [`Scanner::next_deadline`] to decide how long
//! to wait.
//!
//! The observer stays connected while a scan runs. Records queued before the
//! scan are dropped, since the scan reads the state they describe. Records
//! produced while it runs are classified when it finishes, so a page change
//! made mid-scan always leads to one follow-up scan. For the reconnect delay
//! after a scan, records are held without being acted on and are classified
//! once the delay has passed.

mod session;
mod timer;

pub use session::ScannerSession;
pub use timer::Timer;

use crate::{config::HighlighterConfig,
            dom::{Dom, MutationRecord, NodeId, ObserveOptions, UserEvent},
            error::{HighlightError, Result},
            highlight::{HighlightState, SelectOutcome},
            matching::{ContextDescriber, DescribeLimits, GroupMap, ScanResult, is_panel_only_change_in,
                       sort_by_position},
            panel::{Panel, PanelAction},
            settings::{AttributeName, Settings, SettingsChange}};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Disabled,
    Idle,
    Scanning,
    PendingRescan,
}

pub struct Scanner<D: Dom> {
    dom: D,
    config: HighlighterConfig,
    describer: ContextDescriber,
    settings: Settings,
    state: ScannerState,
    session: Option<ScannerSession>,
    panel: Option<Panel>,
    debounce: Timer,
    reconnect: Timer,
    /// Attribute the document observer is currently filtered to
    observed: Option<String>,
    rescan_requested: bool,
    scan_count: u64,
}

impl<D: Dom> Scanner<D> {
    pub fn new(dom: D, config: HighlighterConfig) -> Self {
        let describer = ContextDescriber::with_defaults(DescribeLimits::from(&config));
        Self {
            dom,
            config,
            describer,
            settings: Settings::disabled(),
            state: ScannerState::Disabled,
            session: None,
            panel: None,
            debounce: Timer::new(),
            reconnect: Timer::new(),
            observed: None,
            rescan_requested: false,
            scan_count: 0,
        }
    }

    /// Replace the context describer used for panel items
    pub fn with_describer(mut self, describer: ContextDescriber) -> Self {
        self.describer = describer;
        self
    }

    pub fn state(&self) -> ScannerState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> &HighlighterConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&ScannerSession> {
        self.session.as_ref()
    }

    /// Groups of the latest completed scan, `None` while disabled
    pub fn result(&self) -> Option<&ScanResult> {
        self.session.as_ref().map(ScannerSession::result)
    }

    pub fn panel(&self) -> Option<&Panel> {
        self.panel.as_ref()
    }

    pub fn describer(&self) -> &ContextDescriber {
        &self.describer
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    /// Whether page changes are being acted on: the observer is connected and
    /// the reconnect delay after the last scan has passed
    pub fn is_observing(&self) -> bool {
        self.observed.is_some() && !self.reconnect.is_pending()
    }

    /// Number of scans started so far
    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    /// Earliest pending timer, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.debounce.deadline(), self.reconnect.deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// Switch to new settings
    ///
    /// Enabling (or changing the attribute) scans immediately. Disabling or
    /// clearing the attribute tears the session down. An invalid attribute
    /// name is rejected and leaves the scanner untouched.
    pub fn apply_settings(&mut self, settings: Settings, now: Instant) -> Result<()> {
        let resolved = settings.resolve(&self.config.bare_attributes)?;
        self.settings = settings;

        match resolved {
            None => self.deactivate(),
            Some(attribute) => {
                let unchanged = self
                    .session
                    .as_ref()
                    .is_some_and(|s| s.attribute.full() == attribute.full());
                if !(unchanged && self.state != ScannerState::Disabled) {
                    self.activate(attribute, now);
                }
            }
        }
        Ok(())
    }

    /// Apply a partial settings update on top of the current settings
    pub fn on_settings_changed(&mut self, change: &SettingsChange, now: Instant) -> Result<()> {
        let mut settings = self.settings.clone();
        settings.apply(change);
        self.apply_settings(settings, now)
    }

    /// Turn the overlay off, restoring every style it changed
    pub fn disable(&mut self) {
        self.settings.enabled = false;
        self.deactivate();
    }

    /// Drive the scanner: act on mutation records once the reconnect delay has
    /// passed, handle user events, and run a scan when the debounce timer is due
    pub fn poll(&mut self, now: Instant) {
        if self.state == ScannerState::Disabled {
            self.dom.take_events();
            return;
        }

        if self.reconnect.fire(now) {
            log::trace!("Reconnect delay elapsed");
        }
        if !self.reconnect.is_pending() {
            let records = self.dom.take_records();
            if !records.is_empty() {
                self.on_mutations(&records, now);
            }
        }

        for event in self.dom.take_events() {
            self.handle_event(event);
        }

        if self.debounce.fire(now) {
            self.scan(now);
        }
    }

    /// Feed an observed mutation batch
    pub fn on_mutations(&mut self, batch: &[MutationRecord], now: Instant) {
        if self.state == ScannerState::Disabled || batch.is_empty() {
            return;
        }

        let panel_root = self.panel.as_ref().map(Panel::root);
        self.classify(batch, panel_root, now);
    }

    fn classify(&mut self, batch: &[MutationRecord], panel_root: Option<NodeId>, now: Instant) {
        if is_panel_only_change_in(&self.dom, batch, panel_root) {
            log::trace!("Ignoring {} panel-only mutation records", batch.len());
            return;
        }

        match self.state {
            ScannerState::Scanning => self.rescan_requested = true,
            ScannerState::Idle | ScannerState::PendingRescan => {
                self.state = ScannerState::PendingRescan;
                self.debounce.start(now, self.config.debounce());
            }
            ScannerState::Disabled => {}
        }
    }

    /// Route a user event to the tooltip or the panel
    pub fn handle_event(&mut self, event: UserEvent) {
        if self.state == ScannerState::Disabled {
            return;
        }
        let Some(panel) = self.panel.as_mut() else {
            return;
        };

        match event {
            UserEvent::PointerOver { .. } | UserEvent::PointerOut { .. } => {
                let Some(session) = &self.session else {
                    return;
                };
                if let Err(e) = panel.tooltip_mut().handle(&mut self.dom, &event, session.attribute.full()) {
                    log::debug!("Tooltip update failed: {}", e);
                }
            }
            _ => {
                if let Some(action) = panel.interpret(&self.dom, &event) {
                    self.perform(action);
                }
            }
        }
    }

    pub fn perform(&mut self, action: PanelAction) {
        log::debug!("Panel action: {:?}", action);
        match action {
            PanelAction::Select(value) => {
                self.select_value(&value);
            }
            PanelAction::ToggleHighlightAll => {
                self.toggle_highlight_all();
            }
            PanelAction::Search(text) => self.search(&text),
            PanelAction::ToggleCollapsed => {
                self.toggle_collapsed();
            }
        }
    }

    /// Select the group with `value`, or deselect it when already selected
    ///
    /// Returns `None` when there is no such group.
    pub fn select_value(&mut self, value: &str) -> Option<SelectOutcome> {
        let Self { dom, session, panel, .. } = self;
        let session = session.as_mut()?;
        let group = session.result.find(value)?.clone();
        let outcome = session.highlights.select_group(dom, &group);

        if let Some(panel) = panel.as_mut() {
            let context = match outcome {
                SelectOutcome::Selected => panel
                    .entries()
                    .iter()
                    .find(|e| e.value == value)
                    .map(|e| e.context.clone())
                    .unwrap_or_default(),
                SelectOutcome::Deselected => String::new(),
            };
            let updated = panel
                .mark_selected(dom, session.highlights.selected_value())
                .and_then(|()| panel.show_context(dom, &context));
            if let Err(e) = updated {
                log::warn!("Failed to update panel selection: {}", e);
            }
        }

        Some(outcome)
    }

    /// Flip highlight-all; returns the new flag
    pub fn toggle_highlight_all(&mut self) -> bool {
        let Self { dom, session, panel, .. } = self;
        let Some(session) = session.as_mut() else {
            return false;
        };
        let active = session.highlights.toggle_all_highlighted(dom, session.result.groups());

        if let Some(panel) = panel.as_ref() {
            let updated = panel
                .set_highlight_all_active(dom, active)
                .and_then(|()| panel.mark_selected(dom, None))
                .and_then(|()| panel.show_context(dom, ""));
            if let Err(e) = updated {
                log::warn!("Failed to update highlight-all button: {}", e);
            }
        }
        active
    }

    /// Filter the panel list; the scan result is not touched
    pub fn search(&mut self, text: &str) {
        if let Some(panel) = self.panel.as_mut() {
            if let Err(e) = panel.search(&mut self.dom, text) {
                log::warn!("Search failed: {}", e);
            }
        }
    }

    /// Collapse or expand the panel; returns whether it is now collapsed
    pub fn toggle_collapsed(&mut self) -> Option<bool> {
        let panel = self.panel.as_mut()?;
        match panel.toggle_collapsed(&mut self.dom) {
            Ok(collapsed) => Some(collapsed),
            Err(e) => {
                log::warn!("Failed to toggle panel: {}", e);
                None
            }
        }
    }

    fn activate(&mut self, attribute: AttributeName, now: Instant) {
        if let Some(mut previous) = self.session.take() {
            previous.highlights.clear(&mut self.dom);
        }

        log::info!("Tracking attribute {}", attribute.full());
        self.session = Some(ScannerSession::new(attribute, HighlightState::from_config(&self.config)));

        if let Some(panel) = &self.panel {
            if let Err(e) = panel.show(&mut self.dom) {
                log::debug!("Failed to show panel: {}", e);
            }
        }
        self.scan(now);
    }

    fn deactivate(&mut self) {
        self.debounce.cancel();
        self.reconnect.cancel();
        self.rescan_requested = false;
        self.stop_observation();

        if let Some(mut session) = self.session.take() {
            session.highlights.clear(&mut self.dom);
        }
        if let Some(panel) = self.panel.as_mut() {
            if let Err(e) = panel.hide(&mut self.dom) {
                log::debug!("Failed to hide panel: {}", e);
            }
        }

        if self.state != ScannerState::Disabled {
            log::info!("Highlighter disabled");
        }
        self.state = ScannerState::Disabled;
    }

    fn scan(&mut self, now: Instant) {
        self.state = ScannerState::Scanning;
        self.debounce.cancel();
        self.reconnect.cancel();
        self.start_observation();
        let stale = self.dom.take_records();
        if !stale.is_empty() {
            log::trace!("Dropping {} records queued before the scan", stale.len());
        }
        self.scan_count += 1;

        let mut panel_root = None;
        if let Err(e) = self.run_scan() {
            log::warn!("Scan aborted: {}", e);
            if matches!(e, HighlightError::PanelNodeMissing(_)) {
                panel_root = self.drop_panel();
            }
        }
        let panel_root = panel_root.or_else(|| self.panel.as_ref().map(Panel::root));

        let records = self.dom.take_records();
        if !records.is_empty() {
            self.classify(&records, panel_root, now);
        }
        self.finish_scan(now);
    }

    fn finish_scan(&mut self, now: Instant) {
        self.reconnect.start(now, self.config.reconnect_delay());
        if std::mem::take(&mut self.rescan_requested) {
            self.state = ScannerState::PendingRescan;
            self.debounce.start(now, self.config.debounce());
        } else {
            self.state = ScannerState::Idle;
        }
    }

    fn run_scan(&mut self) -> Result<()> {
        if self.panel.is_none() {
            self.panel = Some(Panel::mount(&mut self.dom, self.config.tooltip_offset)?);
        }

        let Self {
            dom,
            config,
            describer,
            session,
            panel,
            ..
        } = self;
        let (Some(session), Some(panel)) = (session.as_mut(), panel.as_mut()) else {
            return Ok(());
        };
        panel.ensure_attached(dom)?;

        let attribute = session.attribute.full().to_string();
        let panel_root = panel.root();

        let mut grouped = GroupMap::new();
        for node in dom.query_attribute(&attribute)? {
            if dom.contains(panel_root, node) {
                continue;
            }
            match dom.attribute(node, &attribute) {
                Ok(value) => grouped.insert(value.as_deref(), node),
                Err(e) => log::debug!("Skipping {}: {}", node, e),
            }
        }
        let groups = sort_by_position(grouped.into_groups(), config.position_threshold, |node| {
            dom.bounding_box(node).ok().flatten()
        });
        let result = ScanResult::new(groups);

        let was_all = session.highlights.is_all_highlighted();
        let previous = session.highlights.selected_value().map(str::to_string);
        session.highlights.clear(dom);

        let mut highlights = HighlightState::from_config(config);
        if was_all {
            highlights.highlight_all(dom, result.groups());
        }
        let selected = previous.and_then(|value| result.find(&value).cloned());
        if let Some(group) = &selected {
            highlights.apply_selection(dom, group);
        }

        log::info!(
            "Found {} distinct {} values on {} elements",
            result.len(),
            attribute,
            result.total_elements()
        );
        session.result = result;
        session.highlights = highlights;

        panel.render(dom, &session.result, describer)?;
        panel.set_highlight_all_active(dom, was_all)?;
        panel.mark_selected(dom, session.highlights.selected_value())?;
        if selected.is_none() {
            panel.show_context(dom, "")?;
        }
        Ok(())
    }

    /// Forget a broken panel so the next scan mounts a fresh one; returns the
    /// removed root
    fn drop_panel(&mut self) -> Option<NodeId> {
        let panel = self.panel.take()?;
        if let Err(e) = self.dom.remove(panel.root()) {
            log::debug!("Failed to remove broken panel: {}", e);
        }
        Some(panel.root())
    }

    /// Observe the body for the session's attribute, unless already doing so
    fn start_observation(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let attribute = session.attribute.full();
        if self.observed.as_deref() == Some(attribute) {
            return;
        }

        let options = ObserveOptions::for_attribute(attribute);
        match self.dom.body().and_then(|body| self.dom.observe(body, &options)) {
            Ok(()) => self.observed = Some(attribute.to_string()),
            Err(e) => {
                log::warn!("Failed to observe the document: {}", e);
                self.observed = None;
            }
        }
    }

    fn stop_observation(&mut self) {
        self.dom.disconnect();
        self.reconnect.cancel();
        self.observed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dom::{BoundingBox, Document, ElementNode, InlineStyle, ScrollOptions},
                panel::{LIST_ID, PANEL_ID}};
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn page() -> Document {
        Document::from_tree(ElementNode::new("body").with_children(vec![
            ElementNode::new("button")
                .with_attribute("data-testid", "save")
                .with_text("Save")
                .with_bounding_box(100.0, 50.0, 80.0, 20.0),
            ElementNode::new("a")
                .with_attribute("data-testid", "home")
                .with_attribute("href", "/")
                .with_bounding_box(20.0, 10.0, 40.0, 20.0),
            ElementNode::new("button")
                .with_attribute("data-testid", "save")
                .with_bounding_box(100.0, 300.0, 80.0, 20.0),
        ]))
    }

    fn enabled(t0: Instant) -> Scanner<Document> {
        let mut scanner = Scanner::new(page(), HighlighterConfig::default());
        scanner.apply_settings(Settings::tracking("testid"), t0).unwrap();
        scanner
    }

    fn add_match(scanner: &mut Scanner<Document>, value: &str) -> NodeId {
        let body = scanner.dom().body().unwrap();
        scanner
            .dom_mut()
            .append_tree(body, ElementNode::new("div").with_attribute("data-testid", value))
            .unwrap()
    }

    fn values(scanner: &Scanner<Document>) -> Vec<String> {
        scanner
            .result()
            .map(|r| r.groups().iter().map(|g| g.value.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_enable_scans_immediately() {
        let t0 = Instant::now();
        let scanner = enabled(t0);

        assert_eq!(scanner.state(), ScannerState::Idle);
        assert_eq!(scanner.scan_count(), 1);
        assert_eq!(values(&scanner), vec!["home", "save"]);
        assert_eq!(scanner.result().unwrap().find("save").unwrap().len(), 2);
        assert!(scanner.dom().element_by_id(PANEL_ID).unwrap().is_some());
    }

    #[test]
    fn test_observation_resumes_after_reconnect_delay() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);

        assert!(!scanner.is_observing());
        assert_eq!(scanner.next_deadline(), Some(t0 + ms(50)));

        scanner.poll(t0 + ms(49));
        assert!(!scanner.is_observing());

        scanner.poll(t0 + ms(50));
        assert!(scanner.is_observing());
        assert!(scanner.dom().is_observing());
        assert_eq!(scanner.next_deadline(), None);
    }

    #[test]
    fn test_mutation_schedules_debounced_rescan() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        scanner.poll(t0 + ms(50));

        add_match(&mut scanner, "late");
        scanner.poll(t0 + ms(100));
        assert_eq!(scanner.state(), ScannerState::PendingRescan);
        assert_eq!(scanner.next_deadline(), Some(t0 + ms(400)));

        scanner.poll(t0 + ms(399));
        assert_eq!(scanner.scan_count(), 1);

        scanner.poll(t0 + ms(400));
        assert_eq!(scanner.scan_count(), 2);
        assert_eq!(scanner.state(), ScannerState::Idle);
        assert!(values(&scanner).contains(&"late".to_string()));
    }

    #[test]
    fn test_mutation_burst_coalesces() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        scanner.poll(t0 + ms(50));

        for (i, at) in [100, 200, 300].into_iter().enumerate() {
            add_match(&mut scanner, &format!("burst-{}", i));
            scanner.poll(t0 + ms(at));
        }
        scanner.poll(t0 + ms(599));
        assert_eq!(scanner.scan_count(), 1);

        scanner.poll(t0 + ms(600));
        assert_eq!(scanner.scan_count(), 2);
        assert_eq!(values(&scanner).len(), 5);
    }

    #[test]
    fn test_unrelated_attribute_writes_are_not_observed() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        scanner.poll(t0 + ms(50));

        let node = scanner.result().unwrap().groups()[0].elements[0];
        scanner.dom_mut().set_attribute(node, "class", "busy").unwrap();
        InlineStyle::new("1px solid red", "").write(scanner.dom_mut(), node).unwrap();
        scanner.poll(t0 + ms(60));

        assert_eq!(scanner.state(), ScannerState::Idle);
    }

    #[test]
    fn test_tracked_attribute_change_is_observed() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        scanner.poll(t0 + ms(50));

        let node = scanner.result().unwrap().groups()[0].elements[0];
        scanner.dom_mut().set_attribute(node, "data-testid", "renamed").unwrap();
        scanner.poll(t0 + ms(60));

        assert_eq!(scanner.state(), ScannerState::PendingRescan);
    }

    #[test]
    fn test_panel_only_changes_are_ignored() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        scanner.poll(t0 + ms(50));

        let list = scanner.dom().element_by_id(LIST_ID).unwrap().unwrap();
        scanner.dom_mut().append_tree(list, ElementNode::new("div")).unwrap();
        scanner.poll(t0 + ms(60));

        assert_eq!(scanner.state(), ScannerState::Idle);
        assert_eq!(scanner.next_deadline(), None);
    }

    /// Document that appends a page element the next time the panel list is
    /// cleared, which happens in the middle of every scan
    struct BusyPage {
        doc: Document,
        on_render: Option<ElementNode>,
    }

    impl Dom for BusyPage {
        fn body(&self) -> Result<NodeId> {
            self.doc.body()
        }
        fn query_attribute(&self, attribute: &str) -> Result<Vec<NodeId>> {
            self.doc.query_attribute(attribute)
        }
        fn element_by_id(&self, id: &str) -> Result<Option<NodeId>> {
            self.doc.element_by_id(id)
        }
        fn element(&self, node: NodeId) -> Result<ElementNode> {
            self.doc.element(node)
        }
        fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>> {
            self.doc.attribute(node, name)
        }
        fn bounding_box(&self, node: NodeId) -> Result<Option<BoundingBox>> {
            self.doc.bounding_box(node)
        }
        fn parent(&self, node: NodeId) -> Result<Option<NodeId>> {
            self.doc.parent(node)
        }
        fn is_connected(&self, node: NodeId) -> bool {
            self.doc.is_connected(node)
        }
        fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
            self.doc.contains(ancestor, node)
        }
        fn style_property(&self, node: NodeId, property: &str) -> Result<String> {
            self.doc.style_property(node, property)
        }
        fn set_style_property(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
            self.doc.set_style_property(node, property, value)
        }
        fn scroll_into_view(&mut self, node: NodeId, options: ScrollOptions) -> Result<()> {
            self.doc.scroll_into_view(node, options)
        }
        fn create_element(&mut self, tag_name: &str) -> Result<NodeId> {
            self.doc.create_element(tag_name)
        }
        fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
            self.doc.append_child(parent, child)
        }
        fn remove(&mut self, node: NodeId) -> Result<()> {
            self.doc.remove(node)
        }
        fn clear_children(&mut self, node: NodeId) -> Result<()> {
            if let Some(tree) = self.on_render.take() {
                let body = self.doc.body()?;
                self.doc.append_tree(body, tree)?;
            }
            self.doc.clear_children(node)
        }
        fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
            self.doc.set_attribute(node, name, value)
        }
        fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
            self.doc.remove_attribute(node, name)
        }
        fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
            self.doc.set_text(node, text)
        }
        fn observe(&mut self, target: NodeId, options: &ObserveOptions) -> Result<()> {
            self.doc.observe(target, options)
        }
        fn disconnect(&mut self) {
            self.doc.disconnect()
        }
        fn take_records(&mut self) -> Vec<MutationRecord> {
            self.doc.take_records()
        }
        fn take_events(&mut self) -> Vec<UserEvent> {
            self.doc.take_events()
        }
    }

    #[test]
    fn test_mutation_during_scan_gets_one_follow_up() {
        let t0 = Instant::now();
        let busy = BusyPage {
            doc: page(),
            on_render: None,
        };
        let mut scanner = Scanner::new(busy, HighlighterConfig::default());
        scanner.apply_settings(Settings::tracking("testid"), t0).unwrap();
        scanner.poll(t0 + ms(50));

        let body = scanner.dom().body().unwrap();
        scanner
            .dom_mut()
            .doc
            .append_tree(body, ElementNode::new("div").with_attribute("data-testid", "first"))
            .unwrap();
        scanner.dom_mut().on_render = Some(ElementNode::new("div").with_attribute("data-testid", "mid-scan"));
        scanner.poll(t0 + ms(60));
        scanner.poll(t0 + ms(360));

        assert_eq!(scanner.scan_count(), 2);
        assert!(scanner.dom().on_render.is_none());
        let values: Vec<&str> = scanner.result().unwrap().groups().iter().map(|g| g.value.as_str()).collect();
        assert!(values.contains(&"first"));
        assert!(!values.contains(&"mid-scan"));
        assert_eq!(scanner.state(), ScannerState::PendingRescan);
        assert_eq!(scanner.next_deadline(), Some(t0 + ms(410)));

        scanner.poll(t0 + ms(410));
        scanner.poll(t0 + ms(659));
        assert_eq!(scanner.scan_count(), 2);

        scanner.poll(t0 + ms(660));
        assert_eq!(scanner.scan_count(), 3);
        assert_eq!(scanner.state(), ScannerState::Idle);
        assert!(scanner.result().unwrap().find("mid-scan").is_some());

        scanner.poll(t0 + ms(2000));
        assert_eq!(scanner.scan_count(), 3);
    }

    #[test]
    fn test_mutation_during_reconnect_delay_is_held() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);

        add_match(&mut scanner, "late");
        scanner.poll(t0 + ms(10));
        assert_eq!(scanner.state(), ScannerState::Idle);

        scanner.poll(t0 + ms(50));
        assert_eq!(scanner.state(), ScannerState::PendingRescan);
        assert_eq!(scanner.next_deadline(), Some(t0 + ms(350)));

        scanner.poll(t0 + ms(350));
        assert_eq!(scanner.scan_count(), 2);
        assert!(values(&scanner).contains(&"late".to_string()));
    }

    #[test]
    fn test_scan_writes_do_not_schedule_rescans() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        scanner.toggle_highlight_all();
        scanner.select_value("home");

        scanner.poll(t0 + ms(50));
        scanner.poll(t0 + ms(1000));

        assert_eq!(scanner.state(), ScannerState::Idle);
        assert_eq!(scanner.scan_count(), 1);
    }

    #[test]
    fn test_disable_cancels_timers_and_restores() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        scanner.poll(t0 + ms(50));
        scanner.toggle_highlight_all();
        add_match(&mut scanner, "late");
        scanner.poll(t0 + ms(60));
        assert!(scanner.next_deadline().is_some());

        scanner.apply_settings(Settings::disabled(), t0 + ms(70)).unwrap();

        assert_eq!(scanner.state(), ScannerState::Disabled);
        assert_eq!(scanner.next_deadline(), None);
        assert!(scanner.session().is_none());
        assert!(!scanner.dom().is_observing());

        let doc = scanner.dom();
        for node in doc.query_attribute("data-testid").unwrap() {
            assert_eq!(InlineStyle::read(doc, node).unwrap(), InlineStyle::default());
        }
        let panel = doc.element_by_id(PANEL_ID).unwrap().unwrap();
        assert_eq!(doc.style_property(panel, "display").unwrap(), "none");

        scanner.poll(t0 + ms(1000));
        assert_eq!(scanner.scan_count(), 1);
    }

    #[test]
    fn test_clearing_attribute_disables() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);

        scanner.on_settings_changed(&SettingsChange::attribute(None), t0).unwrap();
        assert_eq!(scanner.state(), ScannerState::Disabled);
        assert!(scanner.settings().enabled);
    }

    #[test]
    fn test_reenable_shows_panel_again() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        scanner.disable();
        scanner.apply_settings(Settings::tracking("testid"), t0).unwrap();

        let panel = scanner.panel().unwrap().root();
        assert_eq!(scanner.dom().style_property(panel, "display").unwrap(), "");
        assert_eq!(scanner.state(), ScannerState::Idle);
        assert_eq!(scanner.scan_count(), 2);
    }

    #[test]
    fn test_attribute_change_rescans_immediately() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        let home = scanner.result().unwrap().find("home").unwrap().elements[0];
        scanner.dom_mut().set_attribute(home, "data-qa", "nav").unwrap();

        scanner.on_settings_changed(&SettingsChange::attribute(Some("qa".into())), t0).unwrap();

        assert_eq!(scanner.scan_count(), 2);
        assert_eq!(values(&scanner), vec!["nav"]);
        assert_eq!(scanner.session().unwrap().attribute().full(), "data-qa");
    }

    #[test]
    fn test_same_settings_do_not_rescan() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        scanner.apply_settings(Settings::tracking("data-testid"), t0).unwrap();

        assert_eq!(scanner.scan_count(), 1);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);

        let err = scanner.apply_settings(Settings::tracking("bad name"), t0).unwrap_err();
        assert!(matches!(err, HighlightError::InvalidSettings(_)));
        assert_eq!(scanner.state(), ScannerState::Idle);
        assert_eq!(scanner.settings().attribute.as_deref(), Some("testid"));
    }

    #[test]
    fn test_rescan_keeps_highlight_all_and_selection() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        let config = HighlighterConfig::default();

        scanner.toggle_highlight_all();
        assert_eq!(scanner.select_value("save"), Some(SelectOutcome::Selected));
        let scrolls = scanner.dom().scroll_log().len();

        scanner.poll(t0 + ms(50));
        let late = add_match(&mut scanner, "late");
        scanner.poll(t0 + ms(60));
        scanner.poll(t0 + ms(360));
        assert_eq!(scanner.scan_count(), 2);

        let highlights = scanner.session().unwrap().highlights();
        assert!(highlights.is_all_highlighted());
        assert_eq!(highlights.selected_value(), Some("save"));
        assert_eq!(InlineStyle::read(scanner.dom(), late).unwrap(), config.all_style);
        let save = scanner.result().unwrap().find("save").unwrap().elements[0];
        assert_eq!(InlineStyle::read(scanner.dom(), save).unwrap(), config.selected_style);
        assert_eq!(scanner.dom().scroll_log().len(), scrolls);
    }

    #[test]
    fn test_selection_dropped_when_value_disappears() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        scanner.select_value("home");
        scanner.poll(t0 + ms(50));

        let home = scanner.result().unwrap().find("home").unwrap().elements[0];
        scanner.dom_mut().remove(home).unwrap();
        scanner.poll(t0 + ms(60));
        scanner.poll(t0 + ms(360));

        assert_eq!(values(&scanner), vec!["save"]);
        assert_eq!(scanner.session().unwrap().highlights().selected(), None);
    }

    #[test]
    fn test_select_unknown_value() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);

        assert_eq!(scanner.select_value("missing"), None);
    }

    #[test]
    fn test_missing_panel_node_aborts_and_remounts() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        let list = scanner.dom().element_by_id(LIST_ID).unwrap().unwrap();
        scanner.dom_mut().remove(list).unwrap();
        let broken = scanner.panel().unwrap().root();

        scanner.poll(t0 + ms(50));
        add_match(&mut scanner, "late");
        scanner.poll(t0 + ms(60));
        scanner.poll(t0 + ms(360));

        assert_eq!(scanner.state(), ScannerState::Idle);
        assert!(scanner.panel().is_none());
        assert!(!scanner.dom().is_connected(broken));
        assert!(!values(&scanner).contains(&"late".to_string()));

        scanner.poll(t0 + ms(410));
        add_match(&mut scanner, "later");
        scanner.poll(t0 + ms(420));
        scanner.poll(t0 + ms(720));

        assert!(scanner.panel().is_some());
        assert!(values(&scanner).contains(&"later".to_string()));
    }

    #[test]
    fn test_panel_items_are_not_matches() {
        let t0 = Instant::now();
        let mut scanner = enabled(t0);
        assert!(!scanner.panel().unwrap().entries().is_empty());

        scanner
            .on_settings_changed(&SettingsChange::attribute(Some("data-ah-value".into())), t0)
            .unwrap();

        assert!(scanner.result().unwrap().is_empty());
    }
}
