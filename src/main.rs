use anyhow::Result;

fn main() -> Result<()> {
    roadmap_editor::run()
}
