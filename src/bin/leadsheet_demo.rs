// Quick demonstration of the leadsheet editing model
// Run with: RUST_LOG=leadsheet=debug cargo run --bin leadsheet_demo

use leadsheet::events::{ChangeEvent, ChangeListener, FollowUps, VetoableListener};
use leadsheet::project::{load_snapshot, save_snapshot};
use leadsheet::{Change, ItemKinds, Leadsheet, LeadsheetConfig, Position, TimeSignature};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Stands in for a song structure that refuses to lose its chorus
struct KeepChorus;

impl VetoableListener for KeepChorus {
    fn authorize_change(&self, change: &Change) -> Result<(), String> {
        match change {
            Change::SectionRemoved { section, .. } if section.has_name("Chorus") => {
                Err("The song structure still plays the Chorus".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Prints the resulting section layout after every committed change
struct LayoutPrinter;

impl ChangeListener for LayoutPrinter {
    fn leadsheet_changed(&self, event: &ChangeEvent, _follow_ups: &mut FollowUps) {
        let Some(layout) = event.resulting_layout() else {
            println!("   [{:?}] {}", event.origin, event.change);
            return;
        };
        let spans: Vec<String> = layout
            .iter()
            .map(|span| format!("{} {}..={}", span.name(), span.start_bar, span.end_bar))
            .collect();
        println!("   [{:?}] {} -> {}", event.origin, event.change, spans.join(", "));
    }
}

fn print_sheet(sheet: &Leadsheet) {
    for span in sheet.section_spans() {
        let chords: Vec<String> = sheet
            .query_by_section(span.handle, ItemKinds::CHORD_SYMBOL)
            .map(|items| items.map(|(_, item)| item.to_string()).collect())
            .unwrap_or_default();
        println!(
            "   {} ({}) bars {}..={}: {}",
            span.name(),
            span.time_signature(),
            span.start_bar,
            span.end_bar,
            chords.join(" ")
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Leadsheet editing demo");
    println!("======================");

    let config = LeadsheetConfig::load_or_default()?;
    let mut sheet = Leadsheet::with_config("Intro", TimeSignature::FOUR_FOUR, 8, config)?;
    sheet.add_vetoable_listener(Arc::new(KeepChorus));
    sheet.add_listener(Arc::new(LayoutPrinter));

    sheet.add_chord("Dm7", Position::at_bar(0))?;
    sheet.add_chord("G7", Position::beats(1, 2, 1))?;
    let chorus = sheet.add_section("Chorus", TimeSignature::FOUR_FOUR, 4)?;
    sheet.add_chord("Cmaj7", Position::beats(5, 3, 4))?;

    println!("\nInitial sheet:");
    print_sheet(&sheet);

    println!("\nInserting two bars before the first bar:");
    sheet.insert_bars(0, 2)?;
    print_sheet(&sheet);

    println!("\nSwitching the chorus to 3/4:");
    sheet.set_section_time_signature(chorus, TimeSignature::THREE_FOUR)?;
    print_sheet(&sheet);

    println!("\nTrying to remove the chorus:");
    match sheet.remove_section(chorus) {
        Ok(()) => println!("   removed"),
        Err(e) => println!("   refused: {}", e),
    }

    println!("\nUndoing everything:");
    while sheet.can_undo() {
        if let Some(description) = sheet.undo_description() {
            println!("   undo: {}", description);
        }
        sheet.undo()?;
    }
    print_sheet(&sheet);

    let path = std::env::temp_dir().join("leadsheet_demo.ron");
    save_snapshot(&sheet.snapshot(), &path)?;
    let restored = Leadsheet::from_snapshot(&load_snapshot(&path)?, LeadsheetConfig::default())?;
    println!("\nSaved and reloaded {} ({} items)", path.display(), restored.len());

    Ok(())
}
