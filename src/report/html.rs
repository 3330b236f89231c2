use std::fmt::Write as _;
use std::path::Path;

use crate::error::Result;
use crate::report::{format_american, EventReport, MarketReport, Report};

/// Render the whole report as a standalone HTML page.
pub fn render(report: &Report) -> String {
    let arbitrage = if report.arbitrage_opportunities.is_empty() {
        r#"<p class="text-gray-500">No arbitrage opportunities found</p>"#.to_string()
    } else {
        report
            .arbitrage_opportunities
            .iter()
            .map(|e| event_card(e, report.total_stake))
            .collect()
    };
    let other = if report.other_opportunities.is_empty() {
        r#"<p class="text-gray-500">No other markets analyzed</p>"#.to_string()
    } else {
        report
            .other_opportunities
            .iter()
            .map(|e| event_card(e, report.total_stake))
            .collect()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Sports Arbitrage Opportunities</title>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-100 p-8">
    <div class="max-w-7xl mx-auto">
        <h1 class="text-3xl font-bold mb-4">Sports Arbitrage Analysis</h1>
        <p class="text-gray-600 mb-8">Last updated: {updated}</p>

        <div class="mb-12">
            <h2 class="text-2xl font-semibold mb-6">Arbitrage Opportunities ({arb_count})</h2>
            {arbitrage}
        </div>

        <div>
            <button onclick="toggleOtherOpportunities()"
                    class="mb-6 px-4 py-2 bg-blue-500 text-white rounded hover:bg-blue-600">
                Show/Hide Other Opportunities ({other_count})
            </button>
            <div id="otherOpportunities" class="hidden">
                <h2 class="text-2xl font-semibold mb-6">Other Opportunities</h2>
                {other}
            </div>
        </div>
    </div>
    <script>
        function toggleOtherOpportunities() {{
            document.getElementById('otherOpportunities').classList.toggle('hidden');
        }}
    </script>
</body>
</html>
"#,
        updated = report.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        arb_count = report.arbitrage_opportunities.len(),
        other_count = report.other_opportunities.len(),
    )
}

pub async fn write_html(path: impl AsRef<Path>, report: &Report) -> Result<()> {
    tokio::fs::write(path, render(report)).await?;
    Ok(())
}

fn event_card(event: &EventReport, total_stake: f64) -> String {
    let sections: String = event
        .market_analyses
        .iter()
        .map(|m| market_section(m, total_stake))
        .collect();

    format!(
        r#"
        <div class="bg-white rounded-lg shadow-lg p-6 mb-8">
            <div class="mb-4">
                <h3 class="text-xl font-bold">{sport}</h3>
                <p class="text-gray-600">{matchup}<br>{commence}</p>
            </div>
            {sections}
        </div>"#,
        sport = escape(&event.sport_title),
        matchup = escape(&event.matchup),
        commence = event.commence_time.format("%Y-%m-%d %H:%M UTC"),
    )
}

fn market_section(market: &MarketReport, total_stake: f64) -> String {
    let row_class = if market.has_arbitrage { "bg-green-50" } else { "" };

    let mut rows = String::new();
    for opp in &market.opportunities {
        let bet = market
            .bet_sizes
            .as_ref()
            .and_then(|bets| bets.get(&opp.outcome))
            .map(|amount| format!("${amount:.2}"))
            .unwrap_or_else(|| "-".to_string());
        // Writing into a String cannot fail.
        let _ = write!(
            rows,
            r#"
                    <tr class="{row_class}">
                        <td class="px-4 py-2 border">{outcome}</td>
                        <td class="px-4 py-2 border">{odds}</td>
                        <td class="px-4 py-2 border">{bookie}</td>
                        <td class="px-4 py-2 border">{bet}</td>
                    </tr>"#,
            outcome = escape(&opp.outcome),
            odds = format_american(opp.odds),
            bookie = escape(&opp.bookie),
        );
    }

    let coefficient_class = if market.has_arbitrage { "text-green-600" } else { "" };
    let profit_row = if market.has_arbitrage {
        format!(
            r#"
                    <tr class="bg-gray-50">
                        <td colspan="3" class="px-4 py-2 border font-semibold">Potential Profit</td>
                        <td class="px-4 py-2 border font-semibold text-green-600">{}</td>
                    </tr>"#,
            escape(&market.potential_profit)
        )
    } else {
        String::new()
    };

    format!(
        r#"
            <div class="mb-6">
                <h4 class="text-lg font-semibold mb-2">{title}</h4>
                <table class="min-w-full divide-y divide-gray-200">
                    <thead>
                        <tr class="bg-gray-50">
                            <th class="px-4 py-2 border">Outcome</th>
                            <th class="px-4 py-2 border">Best Odds</th>
                            <th class="px-4 py-2 border">Bookmaker</th>
                            <th class="px-4 py-2 border">Recommended Bet (${total_stake:.0} total)</th>
                        </tr>
                    </thead>
                    <tbody>{rows}
                    </tbody>
                    <tfoot>
                        <tr class="bg-gray-50">
                            <td colspan="3" class="px-4 py-2 border font-semibold">Arbitrage Coefficient</td>
                            <td class="px-4 py-2 border font-semibold {coefficient_class}">{coefficient:.2}%</td>
                        </tr>{profit_row}
                    </tfoot>
                </table>
            </div>"#,
        title = escape(&market.market.to_uppercase()),
        coefficient = market.total_implied_prob,
    )
}

/// Minimal HTML escaping for provider-supplied text.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
