use alloy::primitives::{Address, U256};

/// Local view of one deployed lottery contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotteryRecord {
    pub address: Address,
    pub creator: Address,
    pub max_players: U256,
    pub entry_fee: U256,
    pub player_count: U256,
    pub open: bool,
    pub eth_balance: U256,
    /// Read once when the lottery is discovered.
    pub link_balance: U256,
}

/// Parameters fixed when a lottery is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotteryTerms {
    pub address: Address,
    pub creator: Address,
    pub max_players: U256,
    pub entry_fee: U256,
    pub player_count: U256,
}

impl LotteryTerms {
    /// Combine with the live reads of the lottery.
    pub fn into_record(self, open: bool, eth_balance: U256, link_balance: U256) -> LotteryRecord {
        LotteryRecord {
            address: self.address,
            creator: self.creator,
            max_players: self.max_players,
            entry_fee: self.entry_fee,
            player_count: self.player_count,
            open,
            eth_balance,
            link_balance,
        }
    }
}

/// A contract event translated into a typed update for the projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LotteryUpdate {
    PlayerEntered {
        lottery: Address,
        player: Address,
        player_count: U256,
    },
    LotteryClosed {
        lottery: Address,
        chosen_number: U256,
        winner: Address,
    },
    Received {
        lottery: Address,
        from: Address,
        value: U256,
    },
    LotteryCreated {
        creator: Address,
        lottery: Address,
        max_players: U256,
        entry_fee: U256,
    },
}

impl LotteryUpdate {
    /// Address of the lottery the update is about.
    pub fn lottery(&self) -> Address {
        match self {
            Self::PlayerEntered { lottery, .. }
            | Self::LotteryClosed { lottery, .. }
            | Self::Received { lottery, .. }
            | Self::LotteryCreated { lottery, .. } => *lottery,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerEntered { .. } => "PlayerEntered",
            Self::LotteryClosed { .. } => "LotteryClosed",
            Self::Received { .. } => "Received",
            Self::LotteryCreated { .. } => "LotteryCreated",
        }
    }
}
