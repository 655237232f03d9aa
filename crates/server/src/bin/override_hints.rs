use anyhow::Result;

fn main() -> Result<()> {
    override_hints::main_entry()
}
