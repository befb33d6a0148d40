//! Browser adapters
//!
//! DOM presenter for the game page. Every element the game writes to is
//! looked up once at startup; a missing one is a fatal [`InitError`].

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::error::{InitError, Result};
use crate::levels::LevelDefinition;
use crate::presentation::{Presenter, combo_label};
use crate::sim::{Cell, Outcome};

const BEAVER_HTML: &str = r#"<div class="hole-mask"><div class="beaver"><div class="beaver-container"><div class="beaver-img normal"></div></div></div></div>"#;

/// Attribute carrying a cell's index, read back by the click handler
pub const CELL_INDEX_ATTR: &str = "data-index";

pub fn document() -> Result<Document> {
    web_sys::window()
        .ok_or(InitError::NoWindow)?
        .document()
        .ok_or(InitError::NoDocument)
}

/// Look up a required element by id
pub fn require(document: &Document, id: &str) -> Result<Element> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| InitError::MissingElement(id.to_string()))
}

/// Cell index under a pointer event target, if any
pub fn cell_index_of(target: &web_sys::EventTarget) -> Option<usize> {
    let el = target.dyn_ref::<Element>()?;
    let cell = el.closest(".cell").ok()??;
    cell.get_attribute(CELL_INDEX_ATTR)?.parse().ok()
}

/// Presenter driving the game page
pub struct DomPresenter {
    document: Document,
    container: Element,
    grid: Element,
    cells: Vec<Element>,
    intro: Element,
    game_over: Element,
    pause_screen: Element,
    score: Element,
    level: Element,
    lives: Element,
    final_score: Element,
    final_combo: Element,
    combo: Element,
    intro_high_score: Element,
    intro_max_combo: Element,
    /// Shake the board on wrong hits
    shake: bool,
}

impl DomPresenter {
    pub fn new(document: Document, shake: bool) -> Result<Self> {
        let el = |id: &str| require(&document, id);
        Ok(Self {
            container: el("game-container")?,
            grid: el("grid")?,
            cells: Vec::new(),
            intro: el("intro-screen")?,
            game_over: el("game-over")?,
            pause_screen: el("pause-screen")?,
            score: el("score")?,
            level: el("level")?,
            lives: el("lives")?,
            final_score: el("final-score")?,
            final_combo: el("final-combo")?,
            combo: el("combo-cnt")?,
            intro_high_score: el("intro-high-score")?,
            intro_max_combo: el("intro-max-combo")?,
            document,
            shake,
        })
    }

    fn cell(&self, cell: Cell) -> Option<&Element> {
        self.cells.get(cell.0)
    }

    fn set_shown(el: &Element, shown: bool) {
        let classes = el.class_list();
        let _ = if shown {
            classes.add_1("show")
        } else {
            classes.remove_1("show")
        };
    }
}

impl Presenter for DomPresenter {
    fn show_level(&mut self, level: &LevelDefinition) {
        self.grid.set_inner_html("");
        self.cells.clear();
        for i in 0..level.cell_count() {
            let Ok(cell) = self.document.create_element("div") else {
                log::error!("Failed to create cell {}", i);
                continue;
            };
            cell.set_class_name("cell");
            let _ = cell.set_attribute(CELL_INDEX_ATTR, &i.to_string());
            let _ = self.grid.append_child(&cell);
            self.cells.push(cell);
        }

        if let Some(grid) = self.grid.dyn_ref::<HtmlElement>() {
            let style = grid.style();
            let _ = style.set_property(
                "grid-template-columns",
                &format!("repeat({}, 1fr)", level.cols),
            );
            let _ = style.set_property(
                "grid-template-rows",
                &format!("repeat({}, 1fr)", level.rows),
            );
        }
        if let Some(container) = self.container.dyn_ref::<HtmlElement>() {
            let _ = container
                .style()
                .set_property("background", level.background);
        }
    }

    fn reset_board(&mut self) {
        for cell in &self.cells {
            cell.set_inner_html("");
        }
        self.combo.set_inner_html("");
        Self::set_shown(&self.game_over, false);
    }

    fn hide_intro(&mut self) {
        let _ = self.intro.class_list().add_1("fade-out");
    }

    fn show_intro_stats(&mut self, high_score: u64, max_combo: u32) {
        self.intro_high_score
            .set_text_content(Some(&high_score.to_string()));
        self.intro_max_combo
            .set_text_content(Some(&max_combo.to_string()));
    }

    fn mark_cell_occupied(&mut self, cell: Cell) {
        if let Some(el) = self.cell(cell) {
            el.set_inner_html(BEAVER_HTML);
        }
    }

    fn mark_cell_resolved(&mut self, cell: Cell, outcome: Outcome) {
        let Some(el) = self.cell(cell) else { return };
        let img = el.query_selector(".beaver-img").ok().flatten();
        match outcome {
            Outcome::Hit => {
                if let Some(img) = img {
                    img.set_class_name("beaver-img yes");
                }
            }
            Outcome::Miss => {
                if let Some(beaver) = el.query_selector(".beaver").ok().flatten() {
                    let _ = beaver.class_list().add_1("miss");
                }
                if let Some(img) = img {
                    img.set_class_name("beaver-img no");
                }
            }
        }
    }

    fn clear_cell(&mut self, cell: Cell) {
        if let Some(el) = self.cell(cell) {
            el.set_inner_html("");
        }
    }

    fn update_scoreboard(&mut self, score: u64, level: u32, lives: u8) {
        self.score.set_text_content(Some(&score.to_string()));
        self.level.set_text_content(Some(&level.to_string()));
        self.lives
            .set_text_content(Some(&"\u{2764}".repeat(lives as usize)));
    }

    fn show_combo(&mut self, value: u32) {
        match combo_label(value) {
            Some(label) => self
                .combo
                .set_inner_html(&format!(r#"<div class="combo-pop">{}</div>"#, label)),
            None if value == 0 => self.combo.set_inner_html(""),
            None => {}
        }
    }

    fn show_wrong_hit_alert(&mut self) {
        if !self.shake {
            return;
        }
        let classes = self.container.class_list();
        let _ = classes.remove_1("shake");
        // Force a reflow so the animation restarts
        if let Some(el) = self.container.dyn_ref::<HtmlElement>() {
            let _ = el.offset_width();
        }
        let _ = classes.add_1("shake");
    }

    fn show_paused(&mut self, paused: bool) {
        Self::set_shown(&self.pause_screen, paused);
    }

    fn show_game_over(&mut self, final_score: u64, final_max_combo: u32) {
        self.final_score
            .set_text_content(Some(&final_score.to_string()));
        self.final_combo
            .set_text_content(Some(&final_max_combo.to_string()));
        Self::set_shown(&self.game_over, true);
    }
}
