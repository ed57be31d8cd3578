//! Search posts from the command line

use anyhow::Result;
use std::fmt::Write;

use crate::Folio;

pub async fn run(folio: &Folio, query: &str) -> Result<()> {
    print!("{}", render(folio, query).await?);
    Ok(())
}

async fn render(folio: &Folio, query: &str) -> Result<String> {
    let results = folio.repository().search(query).await?;
    let mut out = String::new();

    if results.is_empty() {
        writeln!(out, "No posts match {:?}", query)?;
        return Ok(out);
    }

    writeln!(out, "Results ({}):", results.len())?;
    for result in results {
        let fields: Vec<_> = result
            .matches
            .iter()
            .map(|m| format!("{:?}", m.field).to_lowercase())
            .collect();
        writeln!(
            out,
            "  {:.3}  {} [{}] ({})",
            result.score,
            result.item.title,
            result.item.slug,
            fields.join(", ")
        )?;
    }

    Ok(out)
}
