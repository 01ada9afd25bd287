use alloy::sol;

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    contract LotteryFactory {
        event LotteryCreated(address creator, address lottery, uint256 maxPlayers, uint256 entryFee);

        function createLottery(uint256 maxPlayers, uint256 entryFee, address owner) external;
        function getLotteriesDetails() external view returns (
            address[] memory lotteries,
            uint256[] memory maxPlayers,
            uint256[] memory entryFees,
            uint256[] memory playerCounts,
            address[] memory creators
        );
    }

    #[sol(rpc)]
    #[derive(Debug)]
    contract Lottery {
        event PlayerEntered(address player, uint256 playerCount);
        event LotteryClosed(uint256 chosenNumber, address winner);
        event Received(address sender, uint256 amount);

        function isActive() external view returns (bool);
        function getBalance() external view returns (uint256);
        function getLinkBalance() external view returns (uint256);
        function owner() external view returns (address);
        function enter() external payable;
        function requestRandomWords(bool enableNativePayment) external returns (uint256 requestId);
    }
}

pub type PlayerEnteredEvent = Lottery::PlayerEntered;
pub type LotteryClosedEvent = Lottery::LotteryClosed;
pub type ReceivedEvent = Lottery::Received;
pub type LotteryCreatedEvent = LotteryFactory::LotteryCreated;
