use pdf_outline::classifier::{classify_block, LayoutContext, Verdict};
use pdf_outline::title::select_title;
use pdf_outline::{extract_blocks, FontProfile, OutlineOptions};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: debug_blocks <pdf_path> [max_page | min-max]");
        std::process::exit(1);
    }

    // Pages are 0-based, matching TextBlock::page
    let range = args.get(2).map(|s| s.as_str()).unwrap_or("0-2");
    let (min_page, max_page) = if let Some((a, b)) = range.split_once('-') {
        (a.parse().unwrap_or(0), b.parse().unwrap_or(2))
    } else {
        (0, range.parse().unwrap_or(2))
    };

    let extracted = extract_blocks(&args[1]).expect("Failed to extract");
    let blocks = &extracted.blocks;
    let options = OutlineOptions::default();

    let profile = FontProfile::from_blocks(blocks);
    println!("=== PROFILE ({} pages, {} blocks) ===", extracted.page_count, blocks.len());
    println!("  body size: {:.1}", profile.body_size());
    println!("  tiers:     {:?}", profile.ranked_sizes());
    for (size, count) in profile.size_frequency() {
        println!("  {:5.1}pt x {}", size, count);
    }
    if let Some(meta) = &extracted.metadata_title {
        println!("  metadata title: {:?}", meta);
    }

    let title = select_title(blocks, &profile, &options);
    println!("  title: {:?} (blocks {:?})", title.text, title.block_indices);
    println!();

    let pool_profile = profile.without(blocks.iter().filter(|b| title.contains(b.block_index)));
    let context = LayoutContext::new(blocks).with_page_heights(&extracted.page_heights);

    for page in min_page..=max_page {
        let page_blocks: Vec<_> = blocks.iter().filter(|b| b.page == page).collect();
        println!("=== PAGE {} ({} blocks) ===", page, page_blocks.len());
        for block in page_blocks {
            let decision = if title.contains(block.block_index) {
                "TITLE".to_string()
            } else {
                match classify_block(block, &context, &pool_profile, &options) {
                    Ok(Verdict::Heading(c)) => format!("{} ({:.2})", c.level, c.signals.confidence()),
                    Ok(Verdict::Rejected(reason)) => format!("-{:?}", reason),
                    Err(e) => format!("ERROR {}", e),
                }
            };
            println!(
                "  #{:<4} y={:7.1} x={:7.1} fs={:5.1} b={} {:<16} text={:?}",
                block.block_index,
                block.bbox.y0,
                block.bbox.x0,
                block.font_size,
                if block.is_bold { 1 } else { 0 },
                decision,
                block.text
            );
        }
        println!();
    }
}
