//! `smartq shops`

use anyhow::Result;
use console::style;
use smartq_client::shops::{self, Shop, ALL_CATEGORY};

use crate::context::{AppContext, Tone};

pub async fn run(
    ctx: &AppContext,
    category: Option<&str>,
    query: Option<&str>,
    list_categories: bool,
) -> Result<()> {
    let feed = ctx.api.list_shops().await?;

    if list_categories {
        for chip in shops::categories(&feed) {
            println!("{chip}");
        }
        return Ok(());
    }

    let in_category: Vec<Shop> = shops::filter_by_category(&feed, category.unwrap_or(ALL_CATEGORY))
        .into_iter()
        .cloned()
        .collect();
    let matches = shops::search(&in_category, query.unwrap_or_default());

    if matches.is_empty() {
        ctx.say(Tone::Warning, "No shops found.");
        return Ok(());
    }

    ctx.say(Tone::Header, &format!("{} shop(s)", matches.len()));
    for shop in matches {
        let mut line = format!("{}  {}", style(&shop.name).bold(), style(shop.category()).cyan());
        if !shop.shop_types.is_empty() {
            line.push_str(&format!("  [{}]", shop.type_label()));
        }
        if let Some(distance) = &shop.distance {
            line.push_str(&format!("  {distance}"));
        }
        if let Some(wait) = &shop.wait_info {
            line.push_str(&format!("  {}", style(wait).dim()));
        }
        println!("{line}");
    }
    Ok(())
}
