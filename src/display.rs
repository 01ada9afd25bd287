use crate::{provider_directory::ProviderDetail, types::LotteryRecord};
use alloy::primitives::{Address, utils::format_ether};
use term_table::row::Row;
use term_table::table_cell::{Alignment as CellAlignment, TableCell};
use term_table::{Table, TableStyle};

fn add_banner(table: &mut Table, text: String, span: usize) {
    table.add_row(Row::new(vec![
        TableCell::builder(text)
            .col_span(span)
            .alignment(CellAlignment::Center)
            .build(),
    ]));
}

fn add_cells<const N: usize>(table: &mut Table, values: [String; N]) {
    table.add_row(Row::new(
        values.into_iter().map(TableCell::new).collect::<Vec<_>>(),
    ));
}

/// Render lotteries as a table, marking the ones owned by `signer`'s account.
pub fn lotteries_table(records: &[LotteryRecord], signer: Option<Address>) -> String {
    let mut table = Table::new();
    table.style = TableStyle::extended();

    add_banner(&mut table, format!("🎲 Lotteries ({}) 🎲", records.len()), 7);
    add_cells(&mut table, [
        "Address".to_string(),
        "Creator".to_string(),
        "Players".to_string(),
        "Entry fee".to_string(),
        "Balance".to_string(),
        "LINK".to_string(),
        "Status".to_string(),
    ]);

    if records.is_empty() {
        add_banner(&mut table, "No lotteries yet".to_string(), 7);
    }

    for record in records {
        let creator = if Some(record.creator) == signer {
            format!("{} (you)", record.creator)
        } else {
            record.creator.to_string()
        };
        let status = if record.open { "open" } else { "closed" };
        add_cells(&mut table, [
            record.address.to_string(),
            creator,
            format!("{}/{}", record.player_count, record.max_players),
            format!("{} ETH", format_ether(record.entry_fee)),
            format!("{} ETH", format_ether(record.eth_balance)),
            format!("{} LINK", format_ether(record.link_balance)),
            status.to_string(),
        ]);
    }

    table.render()
}

/// Render the providers a client can connect through.
pub fn providers_table(providers: &[ProviderDetail], injected: Option<&ProviderDetail>) -> String {
    let mut table = Table::new();
    table.style = TableStyle::extended();

    add_banner(&mut table, "Providers".to_string(), 5);
    add_cells(&mut table, [
        "Name".to_string(),
        "UUID".to_string(),
        "RDNS".to_string(),
        "RPC URL".to_string(),
        "Accounts".to_string(),
    ]);

    let listed = providers.iter().map(|p| (p, "")).chain(injected.map(|p| (p, " (injected)")));
    for (provider, tag) in listed {
        add_cells(&mut table, [
            format!("{}{tag}", provider.info.name),
            provider.info.uuid.clone(),
            provider.info.rdns.clone().unwrap_or_else(|| "-".to_string()),
            provider.endpoint.rpc_url.clone(),
            provider.endpoint.private_keys.len().to_string(),
        ]);
    }

    table.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        provider_directory::{ProviderEndpoint, ProviderInfo},
        testing::record,
    };
    use alloy::primitives::U256;

    #[test]
    fn test_lotteries_table() {
        let mut closed = record(Address::repeat_byte(2), 5, 30);
        closed.open = false;
        closed.eth_balance = U256::from(1_500_000_000_000_000_000u128);
        let records = vec![record(Address::repeat_byte(1), 10, 100), closed];

        let rendered = lotteries_table(&records, Some(Address::repeat_byte(0xcc)));

        assert!(rendered.contains(&Address::repeat_byte(1).to_string()));
        assert!(rendered.contains("0/10"));
        assert!(rendered.contains("closed"));
        assert!(rendered.contains("1.500000000000000000 ETH"));
        assert!(rendered.contains("(you)"));
    }

    #[test]
    fn test_empty_lotteries_table() {
        assert!(lotteries_table(&[], None).contains("No lotteries yet"));
    }

    #[test]
    fn test_providers_table() {
        let provider = ProviderDetail {
            info: ProviderInfo {
                uuid: "u-1".to_string(),
                name: "Alpha".to_string(),
                rdns: Some("org.alpha".to_string()),
            },
            endpoint: ProviderEndpoint {
                rpc_url: "http://127.0.0.1:8545".to_string(),
                private_keys: vec!["0x01".to_string(), "0x02".to_string()],
            },
        };
        let rendered = providers_table(std::slice::from_ref(&provider), Some(&provider));
        assert!(rendered.contains("org.alpha"));
        assert!(rendered.contains("Alpha (injected)"));
        assert!(!rendered.contains("0x01"));
    }
}
