pub mod binder;
pub mod common;
pub mod contracts;
pub mod factory_client;
pub mod lottery_client;
pub mod roles;

pub use binder::{AlloyBinder, ContractConfig};
pub use contracts::{
    Lottery, LotteryClosedEvent, LotteryCreatedEvent, LotteryFactory, PlayerEnteredEvent,
    ReceivedEvent,
};
pub use factory_client::FactoryClient;
pub use lottery_client::LotteryClient;
pub use roles::{
    ChainBinder, EventStream, FactoryContract, FactoryEvents, FactoryReader, FactoryWriter,
    LotteriesDetails, LotteryContract, LotteryEvents, LotteryReader, LotteryWriter,
};
