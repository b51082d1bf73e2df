//! Policy XML Loader
//!
//! Streams a PAN-OS style configuration with quick-xml and collects every
//! security rule entry together with its scope, device group and stage.
//!
//! Recognised containers:
//! - `shared/{pre,post}-rulebase/security/rules/entry` (hierarchical)
//! - `device-group/entry[@name]/{pre,post}-rulebase/security/rules/entry` (hierarchical)
//! - `device-group[@name]/{pre,post}-rulebase/security/rules/entry` (hierarchical)
//! - `rulebase/security/rules/entry` (flat)
//!
//! Parsing is all-or-nothing: any XML error discards the whole source.

use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;

use super::types::{RuleRecord, RuleScope, RulebaseStage};
use crate::error::RulebaseError;

/// Which policy layout is being parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFormat {
    /// Panorama: shared + device-group pre/post rulebases
    Hierarchical,
    /// Firewall: local rulebase
    Flat,
}

/// Parse a hierarchical (Panorama) policy document
pub fn parse_hierarchical(xml: &str) -> Result<Vec<RuleRecord>, RulebaseError> {
    parse_rules(xml, PolicyFormat::Hierarchical)
}

/// Parse a flat (local firewall) policy document
pub fn parse_flat(xml: &str) -> Result<Vec<RuleRecord>, RulebaseError> {
    parse_rules(xml, PolicyFormat::Flat)
}

pub fn parse_rules(xml: &str, format: PolicyFormat) -> Result<Vec<RuleRecord>, RulebaseError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut walker = RuleWalker::new(format);
    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| xml_error(position, e))?;

        match event {
            XmlEvent::Start(ref e) => walker.start(e, false).map_err(|e| xml_error(position, e))?,
            XmlEvent::Empty(ref e) => walker.start(e, true).map_err(|e| xml_error(position, e))?,
            XmlEvent::Text(ref t) => {
                let text = t.unescape().map_err(|e| xml_error(position, e))?;
                walker.text(&text);
            }
            XmlEvent::End(_) => walker.end(),
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    if !walker.saw_root {
        return Err(RulebaseError::EmptyDocument);
    }
    if !walker.stack.is_empty() {
        return Err(RulebaseError::Xml {
            position: reader.buffer_position(),
            message: format!("unclosed element <{}>", walker.stack[walker.stack.len() - 1].tag),
        });
    }

    Ok(walker.rules)
}

fn xml_error(position: usize, err: quick_xml::Error) -> RulebaseError {
    RulebaseError::Xml {
        position,
        message: err.to_string(),
    }
}

// ============================================================================
// WALKER STATE
// ============================================================================

#[derive(Debug)]
struct Frame {
    tag: String,
    name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleChild {
    LogSetting,
    LogStart,
    LogEnd,
}

/// Rule entry currently being read
#[derive(Debug)]
struct PendingRule {
    /// Stack depth once the rule's own frame is pushed
    depth: usize,
    name: String,
    scope: RuleScope,
    device_group: Option<String>,
    stage: RulebaseStage,
    profile: Option<String>,
    has_log_setting: bool,
    log_start: bool,
    log_end: bool,
    child: Option<RuleChild>,
}

impl PendingRule {
    fn finish(self) -> RuleRecord {
        RuleRecord {
            name: self.name,
            scope: self.scope,
            device_group: self.device_group,
            rulebase_stage: self.stage,
            log_forwarding_profile: self.profile,
            log_at_session_start: self.log_start,
            log_at_session_end: self.log_end,
            forwarding_enabled: self.has_log_setting,
        }
    }
}

struct RuleWalker {
    format: PolicyFormat,
    stack: Vec<Frame>,
    pending: Option<PendingRule>,
    rules: Vec<RuleRecord>,
    saw_root: bool,
}

impl RuleWalker {
    fn new(format: PolicyFormat) -> Self {
        Self {
            format,
            stack: Vec::new(),
            pending: None,
            rules: Vec::new(),
            saw_root: false,
        }
    }

    fn start(&mut self, e: &BytesStart, empty: bool) -> Result<(), quick_xml::Error> {
        self.saw_root = true;
        let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let name = name_attr(e)?;

        if let Some(rule) = self.pending.as_mut() {
            // Direct child of the rule entry
            if self.stack.len() == rule.depth {
                let child = match tag.as_str() {
                    "log-setting" => Some(RuleChild::LogSetting),
                    "log-start" => Some(RuleChild::LogStart),
                    "log-end" => Some(RuleChild::LogEnd),
                    _ => None,
                };
                if child == Some(RuleChild::LogSetting) {
                    rule.has_log_setting = true;
                }
                if !empty {
                    rule.child = child;
                }
            }
        } else if tag == "entry" {
            if let Some((scope, device_group, stage)) = self.rule_context() {
                let rule = PendingRule {
                    depth: self.stack.len() + 1,
                    name: name.clone().unwrap_or_default(),
                    scope,
                    device_group,
                    stage,
                    profile: None,
                    has_log_setting: false,
                    log_start: false,
                    log_end: false,
                    child: None,
                };
                if empty {
                    self.commit(rule);
                } else {
                    self.pending = Some(rule);
                }
            }
        }

        if !empty {
            self.stack.push(Frame { tag, name });
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        let Some(rule) = self.pending.as_mut() else {
            return;
        };
        if self.stack.len() != rule.depth + 1 {
            return;
        }
        match rule.child {
            Some(RuleChild::LogSetting) => {
                let profile = text.trim();
                if !profile.is_empty() {
                    rule.profile = Some(profile.to_string());
                }
            }
            Some(RuleChild::LogStart) => rule.log_start = text.trim().eq_ignore_ascii_case("yes"),
            Some(RuleChild::LogEnd) => rule.log_end = text.trim().eq_ignore_ascii_case("yes"),
            None => {}
        }
    }

    fn end(&mut self) {
        self.stack.pop();
        let depth = self.stack.len();

        let finished = match self.pending.as_mut() {
            Some(rule) if depth == rule.depth => {
                rule.child = None;
                false
            }
            Some(rule) => depth + 1 == rule.depth,
            None => false,
        };

        if finished {
            if let Some(rule) = self.pending.take() {
                self.commit(rule);
            }
        }
    }

    fn commit(&mut self, rule: PendingRule) {
        if rule.name.is_empty() {
            log::debug!("Skipping unnamed rule entry in {} rulebase", rule.stage);
            return;
        }
        self.rules.push(rule.finish());
    }

    /// Scope/stage for an `entry` opened at the current stack position, if it
    /// is a security rule for this format.
    fn rule_context(&self) -> Option<(RuleScope, Option<String>, RulebaseStage)> {
        let n = self.stack.len();
        if n < 3 || self.stack[n - 1].tag != "rules" || self.stack[n - 2].tag != "security" {
            return None;
        }
        let stage_idx = n - 3;
        let stage = RulebaseStage::from_tag(&self.stack[stage_idx].tag)?;

        match (self.format, stage) {
            (PolicyFormat::Flat, RulebaseStage::Local) => Some((RuleScope::Local, None, stage)),
            (PolicyFormat::Hierarchical, RulebaseStage::Pre | RulebaseStage::Post) => {
                let ancestors = &self.stack[..stage_idx];
                if let Some(dg_idx) = ancestors.iter().rposition(|f| f.tag == "device-group") {
                    let dg_name = ancestors
                        .get(dg_idx + 1)
                        .filter(|f| f.tag == "entry")
                        .and_then(|f| f.name.clone())
                        .or_else(|| ancestors[dg_idx].name.clone())?;
                    Some((RuleScope::DeviceGroup, Some(dg_name), stage))
                } else if ancestors.iter().any(|f| f.tag == "shared") {
                    Some((RuleScope::Shared, None, stage))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

fn name_attr(e: &BytesStart) -> Result<Option<String>, quick_xml::Error> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"name" {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
